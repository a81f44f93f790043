//! `Sum` / `SumWithNegative` (spec.md section 4.2): cells whose (possibly
//! signed) values must sum to a fixed target.
//!
//! Not present in the teacher (a plain Sudoku has no arithmetic constraints),
//! so the propagation shape is built fresh around the teacher's existing
//! primitives: `LookupTables::combinations_for_count_and_sum` supplies the
//! combinatorics, and feasibility-per-combination is checked with the same
//! bipartite-matching routine `handlers::all_different` already has, since
//! "does this combination's values fit these cells" is exactly a perfect
//! bipartite matching between combination-values and cells. A cell keeps a
//! candidate value only if it survives in at least one sum-feasible
//! combination — sound, though not maximally tight when a value is
//! matchable in isolation but not reachable by any augmenting path; callers
//! needing full arc-consistency on small cages should keep the cage small
//! (the optimizer already discards synthesized sums above ~6 cells).
//! Repeated-cell ("duplicate-cell") sums are not handled here: they are
//! resolved away into `BinaryConstraint` pairs before a `Sum` handler is
//! ever constructed (see `constraint.rs`).

use std::sync::Arc;

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::handlers::all_different::enforce_all_different;
use crate::lookup::LookupTables;
use crate::types::CellIndex;
use crate::value_set::ValueSet;

/// A `Sum` over `cells` (all contribute with coefficient +1) is just
/// `SumWithNegative` with an empty negative side.
pub struct Sum<VS: ValueSet> {
    inner: SumWithNegative<VS>,
}

impl<VS: ValueSet> Sum<VS> {
    pub fn new(cells: Vec<CellIndex>, target: i64, tables: Arc<LookupTables>) -> Self {
        Self {
            inner: SumWithNegative::new(cells, Vec::new(), target, tables),
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Sum<VS> {
    fn cells(&self) -> &[CellIndex] {
        self.inner.cells()
    }

    fn priority(&self) -> u32 {
        self.inner.priority()
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        self.inner.enforce_consistency(grid, queue)
    }
}

/// `(positive cells) - (negative cells) = target`. Used directly by `Arrow`
/// (bulb cells negated) and by the optimizer's innie/outie synthesis.
pub struct SumWithNegative<VS: ValueSet> {
    positive: Vec<CellIndex>,
    negative: Vec<CellIndex>,
    all_cells: Vec<CellIndex>,
    target: i64,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

const SMALL_CAGE_THRESHOLD: usize = 6;

impl<VS: ValueSet> SumWithNegative<VS> {
    pub fn new(
        positive: Vec<CellIndex>,
        negative: Vec<CellIndex>,
        target: i64,
        tables: Arc<LookupTables>,
    ) -> Self {
        let mut all_cells = positive.clone();
        all_cells.extend(negative.iter());
        Self {
            positive,
            negative,
            all_cells,
            target,
            tables,
            _marker: std::marker::PhantomData,
        }
    }

    /// Bound-consistency narrowing for a single-cell side: if exactly one
    /// cell sits on `cells`, its value is pinned to `target (+/-) the other
    /// side's achievable range`, so we can narrow it directly without
    /// combinatorics. Used by `Arrow` (one negative cell, the bulb) and by
    /// 1-cell Sum/SumWithNegative degenerate cases.
    fn narrow_singleton_side(
        &self,
        grid: &mut [VS],
        cells: &[CellIndex],
        other_min: i64,
        other_max: i64,
        sign: i64,
    ) -> Result<Option<CellIndex>, Contradiction> {
        if cells.len() != 1 {
            return Ok(None);
        }
        let cell = cells[0];
        // sign * cell_value falls in [self.target - other_max, self.target - other_min]
        // when `cells` is the negative side (sign = -1) or the positive side
        // (sign = 1); derive the achievable [lo, hi] for this one cell.
        let (lo, hi) = if sign > 0 {
            (self.target - other_max, self.target - other_min)
        } else {
            (other_min - self.target, other_max - self.target)
        };
        if hi < 1 || lo > self.tables.num_values as i64 {
            return Err(Contradiction);
        }
        let lo = lo.max(1) as u8;
        let hi = hi.min(self.tables.num_values as i64) as u8;
        let mask = range_mask(lo, hi, self.tables.num_values);
        let narrowed = grid[cell].intersection(&VS::from_bits(mask));
        if narrowed.is_empty() {
            return Err(Contradiction);
        }
        if !narrowed.equals(&grid[cell]) {
            grid[cell] = narrowed;
            return Ok(Some(cell));
        }
        Ok(None)
    }

    fn side_bounds(&self, grid: &[VS], cells: &[CellIndex]) -> (i64, i64) {
        let mut min = 0i64;
        let mut max = 0i64;
        for &c in cells {
            let (lo, hi) = self.tables.min_max[grid[c].to_bits() as usize];
            min += lo as i64;
            max += hi as i64;
        }
        (min, max)
    }

    fn bound_check(&self, grid: &[VS]) -> Result<(), Contradiction> {
        let mut min = 0i64;
        let mut max = 0i64;
        for &c in &self.positive {
            let (lo, hi) = self.tables.min_max[grid[c].to_bits() as usize];
            min += lo as i64;
            max += hi as i64;
        }
        for &c in &self.negative {
            let (lo, hi) = self.tables.min_max[grid[c].to_bits() as usize];
            min -= hi as i64;
            max -= lo as i64;
        }
        if self.target < min || self.target > max {
            return Err(Contradiction);
        }
        Ok(())
    }

    /// Restricts `cells` by a union of `count`-sized combinations summing to
    /// `wanted_sum`, each checked for cell-feasibility via bipartite
    /// matching, then intersects the result into `grid`. Returns the cells
    /// that were actually narrowed.
    fn combinatorial_prune(
        &self,
        grid: &mut [VS],
        cells: &[CellIndex],
        wanted_sum: i64,
    ) -> Result<Vec<CellIndex>, Contradiction> {
        if cells.len() > SMALL_CAGE_THRESHOLD || wanted_sum < 0 {
            return Ok(Vec::new());
        }
        let combos = self
            .tables
            .combinations_for_count_and_sum(cells.len(), wanted_sum as u32);
        if combos.is_empty() {
            return Err(Contradiction);
        }

        let mut allowed = vec![VS::empty(); cells.len()];
        let mut any_feasible = false;

        for &combo in combos {
            let combo_vs = VS::from_bits(combo.to_bits());
            let mut nodes: Vec<VS> = cells.iter().map(|&c| grid[c].intersection(&combo_vs)).collect();
            let mut assignees = vec![0usize; cells.len()];
            if super_matching(&nodes, &mut assignees) {
                any_feasible = true;
                for (i, node) in nodes.drain(..).enumerate() {
                    allowed[i].add_set(&node);
                }
            }
        }

        if !any_feasible {
            return Err(Contradiction);
        }

        let mut touched = Vec::new();
        for (i, &cell) in cells.iter().enumerate() {
            let narrowed = grid[cell].intersection(&allowed[i]);
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                touched.push(cell);
            }
        }
        Ok(touched)
    }
}

/// Bitmask of display values in `[lo, hi]` inclusive.
fn range_mask(lo: u8, hi: u8, num_values: u8) -> u16 {
    if lo > hi || lo == 0 {
        return 0;
    }
    let all = if num_values >= 16 {
        u16::MAX
    } else {
        (1u16 << num_values) - 1
    };
    let below_lo = (1u16 << (lo - 1)) - 1;
    let up_to_hi = if hi >= 16 { u16::MAX } else { (1u16 << hi) - 1 };
    all & up_to_hi & !below_lo
}

/// Reuses `all_different`'s matching routine as a plain feasibility check
/// (a perfect matching exists iff the combination's values can be
/// distributed across these cells).
fn super_matching<VS: ValueSet>(nodes: &[VS], assignees: &mut [usize]) -> bool {
    // `enforce_all_different` both checks and narrows; here we only need the
    // matching's existence, so run it against a scratch copy.
    let mut scratch: Vec<VS> = nodes.to_vec();
    let cells: Vec<CellIndex> = (0..nodes.len()).collect();
    let _ = assignees;
    enforce_all_different(&mut scratch, &cells)
}

impl<VS: ValueSet> Handler<VS> for SumWithNegative<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.all_cells
    }

    fn priority(&self) -> u32 {
        self.all_cells.len() as u32
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        self.bound_check(grid)?;

        let (pos_min, pos_max) = self.side_bounds(grid, &self.positive);
        let (neg_min, neg_max) = self.side_bounds(grid, &self.negative);

        if let Some(cell) = self.narrow_singleton_side(grid, &self.negative, pos_min, pos_max, -1)? {
            queue.add_for_cell(cell);
        }
        if let Some(cell) = self.narrow_singleton_side(grid, &self.positive, neg_min, neg_max, 1)? {
            queue.add_for_cell(cell);
        }

        if self.negative.is_empty() && self.positive.len() <= SMALL_CAGE_THRESHOLD {
            let touched = self.combinatorial_prune(grid, &self.positive, self.target)?;
            queue.add_for_cells(&touched);
        }

        Ok(())
    }
}
