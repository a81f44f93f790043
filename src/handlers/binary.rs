//! `BinaryConstraint` and `BinaryPairwise` (spec.md section 4.2): pairwise
//! relation tables. `BinaryConstraint` relates exactly two cells via a
//! `(numValues x numValues)` allowed-pairs bitmap (Kropki dots, XV, anti-
//! consecutive, and 2-cell `Sum`/`SumWithNegative` specializations all
//! reduce to this); `BinaryPairwise` relates a small cell set by checking
//! every pair against its own table (forward checking), used for things
//! like anti-knight/anti-king once resolved to concrete cell pairs.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

/// `table[v]` is the set of values the other cell may hold when this cell is
/// `v`. Symmetric tables (Kropki, XV) are built with the same table used
/// from both sides by the caller.
pub struct BinaryConstraint<VS: ValueSet> {
    cells: [CellIndex; 2],
    table: Vec<VS>,
}

impl<VS: ValueSet> BinaryConstraint<VS> {
    pub fn new(a: CellIndex, b: CellIndex, table: Vec<VS>) -> Self {
        Self { cells: [a, b], table }
    }

    fn propagate_side(
        &self,
        grid: &mut [VS],
        from: usize,
        to: usize,
    ) -> Result<Option<CellIndex>, Contradiction> {
        let mut allowed = VS::empty();
        let mut v = grid[self.cells[from]];
        while let Some(value) = v.pop() {
            allowed.add_set(&self.table[value as usize]);
        }
        let narrowed = grid[self.cells[to]].intersection(&allowed);
        if narrowed.is_empty() {
            return Err(Contradiction);
        }
        if !narrowed.equals(&grid[self.cells[to]]) {
            grid[self.cells[to]] = narrowed;
            return Ok(Some(self.cells[to]));
        }
        Ok(None)
    }
}

impl<VS: ValueSet> Handler<VS> for BinaryConstraint<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        if let Some(cell) = self.propagate_side(grid, 0, 1)? {
            queue.add_for_cell(cell);
        }
        if let Some(cell) = self.propagate_side(grid, 1, 0)? {
            queue.add_for_cell(cell);
        }
        Ok(())
    }
}

/// A small cell set (typically <= 4) with a table of allowed pairs per
/// cell-pair, enforced by forward checking: each pair is narrowed
/// independently, repeated to fixpoint by the work-queue rather than inside
/// a single call (each `enforce_consistency` does exactly one narrowing
/// pass over every pair it owns, same as the teacher's handlers keep their
/// own pass single-shot and rely on re-queuing for further tightening).
pub struct BinaryPairwise<VS: ValueSet> {
    cells: Vec<CellIndex>,
    pair_tables: Vec<((usize, usize), Vec<VS>)>,
}

impl<VS: ValueSet> BinaryPairwise<VS> {
    pub fn new(cells: Vec<CellIndex>, pair_tables: Vec<((usize, usize), Vec<VS>)>) -> Self {
        Self { cells, pair_tables }
    }
}

impl<VS: ValueSet> Handler<VS> for BinaryPairwise<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut touched = Vec::new();
        for &((i, j), ref table) in &self.pair_tables {
            let a = self.cells[i];
            let b = self.cells[j];

            let mut allowed_b = VS::empty();
            let mut va = grid[a];
            while let Some(value) = va.pop() {
                allowed_b.add_set(&table[value as usize]);
            }
            let narrowed_b = grid[b].intersection(&allowed_b);
            if narrowed_b.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed_b.equals(&grid[b]) {
                grid[b] = narrowed_b;
                touched.push(b);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}
