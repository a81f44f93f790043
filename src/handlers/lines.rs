//! Line/set constraints (spec.md section 4.2's `CountingCircles / Quad / Dot
//! / Whispers / Renban / Between / Modular / Entropic / Palindrome /
//! RegionSumLine / Zipper` row). Most of this family reduces to a
//! `BinaryConstraint` table (Dot, Modular, Entropic, Zipper-pair) built once
//! at constraint-resolution time with the appropriate per-value table, or to
//! `AllDifferent`/`Sum` directly (Renban, RegionSumLine); the handlers below
//! cover the ones with genuinely their own propagation shape.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::lookup::LookupTables;
use crate::types::CellIndex;
use crate::value_set::ValueSet;
use std::sync::Arc;

/// `Whispers`: adjacent cells along the line differ by at least `min_diff`.
/// Propagated as a sliding pairwise bound: for neighbors `(a, b)`, `a`'s
/// allowed values are restricted to those at least `min_diff` away from
/// *some* value still possible in `b` (and vice versa).
pub struct Whispers<VS: ValueSet> {
    cells: Vec<CellIndex>,
    min_diff: u8,
    num_values: u8,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Whispers<VS> {
    pub fn new(cells: Vec<CellIndex>, min_diff: u8, num_values: u8) -> Self {
        Self {
            cells,
            min_diff,
            num_values,
            _marker: std::marker::PhantomData,
        }
    }

    fn reachable_from(&self, mask: VS) -> VS {
        let mut out = VS::empty();
        let mut m = mask;
        while let Some(v) = m.pop() {
            // v is 0-based; display = v+1. Anything >= min_diff away.
            for w in 0..self.num_values {
                let diff = (v as i16 - w as i16).unsigned_abs();
                if diff >= self.min_diff as u16 {
                    out.add_set(&VS::from_value(w));
                }
            }
        }
        out
    }
}

impl<VS: ValueSet> Handler<VS> for Whispers<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut touched = Vec::new();
        for w in self.cells.windows(2) {
            let (a, b) = (w[0], w[1]);
            let allowed_b = self.reachable_from(grid[a]);
            let narrowed_b = grid[b].intersection(&allowed_b);
            if narrowed_b.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed_b.equals(&grid[b]) {
                grid[b] = narrowed_b;
                touched.push(b);
            }

            let allowed_a = self.reachable_from(grid[b]);
            let narrowed_a = grid[a].intersection(&allowed_a);
            if narrowed_a.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed_a.equals(&grid[a]) {
                grid[a] = narrowed_a;
                touched.push(a);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

/// `Between`: line cells strictly between two endpoint cells in value.
pub struct Between<VS: ValueSet> {
    low_end: CellIndex,
    high_end: CellIndex,
    between: Vec<CellIndex>,
    all_cells: Vec<CellIndex>,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Between<VS> {
    pub fn new(low_end: CellIndex, high_end: CellIndex, between: Vec<CellIndex>, tables: Arc<LookupTables>) -> Self {
        let mut all_cells = vec![low_end, high_end];
        all_cells.extend(between.iter());
        Self {
            low_end,
            high_end,
            between,
            all_cells,
            tables,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Between<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.all_cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let (lo_min, lo_max) = self.tables.min_max[grid[self.low_end].to_bits() as usize];
        let (hi_min, hi_max) = self.tables.min_max[grid[self.high_end].to_bits() as usize];

        let lower_bound = lo_min.min(hi_min);
        let upper_bound = lo_max.max(hi_max);
        if upper_bound <= lower_bound + 1 && !self.between.is_empty() {
            return Err(Contradiction);
        }

        let mut touched = Vec::new();
        for &cell in &self.between {
            let mask = exclusive_range_mask(lower_bound, upper_bound, self.tables.num_values);
            let narrowed = grid[cell].intersection(&VS::from_bits(mask));
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                touched.push(cell);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

fn exclusive_range_mask(lower: u8, upper: u8, num_values: u8) -> u16 {
    if upper <= lower + 1 {
        return 0;
    }
    let all = if num_values >= 16 { u16::MAX } else { (1u16 << num_values) - 1 };
    let up_to_upper_minus_1 = (1u16 << (upper - 1)) - 1;
    let up_to_lower = (1u16 << lower) - 1;
    all & up_to_upper_minus_1 & !up_to_lower
}

/// `Palindrome`: mirrored cell pairs must hold equal values. Implemented as
/// a degenerate `SameValues`-style equality over singleton pairs.
pub struct Palindrome<VS: ValueSet> {
    pairs: Vec<(CellIndex, CellIndex)>,
    cells: Vec<CellIndex>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Palindrome<VS> {
    pub fn new(pairs: Vec<(CellIndex, CellIndex)>) -> Self {
        let mut cells = Vec::new();
        for &(a, b) in &pairs {
            cells.push(a);
            cells.push(b);
        }
        Self {
            pairs,
            cells,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Palindrome<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut touched = Vec::new();
        for &(a, b) in &self.pairs {
            let shared = grid[a].intersection(&grid[b]);
            if shared.is_empty() {
                return Err(Contradiction);
            }
            if !shared.equals(&grid[a]) {
                grid[a] = shared;
                touched.push(a);
            }
            if !shared.equals(&grid[b]) {
                grid[b] = shared;
                touched.push(b);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

/// `Renban`'s run-of-consecutive-values half (paired at resolution time with
/// a plain `AllDifferent` over the same cells): bound-only propagation,
/// restricting every cell to the union of every length-`n` window of values
/// still wide enough to fit the line's current candidate span. Not full arc
/// consistency (it doesn't rule out a window with no feasible assignment),
/// matching the conservative treatment `Between`/`PillArrow` already take.
pub struct ConsecutiveSet<VS: ValueSet> {
    cells: Vec<CellIndex>,
    len: u8,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> ConsecutiveSet<VS> {
    pub fn new(cells: Vec<CellIndex>, len: u8, tables: Arc<LookupTables>) -> Self {
        Self {
            cells,
            len,
            tables,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for ConsecutiveSet<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let num_values = self.tables.num_values;
        let mut global_min = num_values;
        let mut global_max = 1u8;
        for &cell in &self.cells {
            if grid[cell].is_empty() {
                return Err(Contradiction);
            }
            let (lo, hi) = self.tables.min_max[grid[cell].to_bits() as usize];
            global_min = global_min.min(lo);
            global_max = global_max.max(hi);
        }

        let n = self.len;
        let lowest_start = global_max.saturating_sub(n - 1).max(1);
        let highest_start = global_min.min(num_values - n + 1);
        if lowest_start > highest_start {
            return Err(Contradiction);
        }
        let window_hi = highest_start + n - 1;
        let allowed = exclusive_inclusive_range_mask(lowest_start, window_hi, num_values);

        let mut touched = Vec::new();
        for &cell in &self.cells {
            let narrowed = grid[cell].intersection(&VS::from_bits(allowed));
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                touched.push(cell);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

fn exclusive_inclusive_range_mask(lo: u8, hi: u8, num_values: u8) -> u16 {
    let all = if num_values >= 16 { u16::MAX } else { (1u16 << num_values) - 1 };
    let up_to_hi = if hi >= 16 { u16::MAX } else { (1u16 << hi) - 1 };
    let below_lo = (1u16 << (lo - 1)) - 1;
    all & up_to_hi & !below_lo
}

/// `Lockout`: line cells strictly outside the closed interval between the two
/// endpoints, whose endpoints must themselves be at least `gap` apart.
pub struct Lockout<VS: ValueSet> {
    low_end: CellIndex,
    high_end: CellIndex,
    between: Vec<CellIndex>,
    all_cells: Vec<CellIndex>,
    gap: u8,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Lockout<VS> {
    pub fn new(
        low_end: CellIndex,
        high_end: CellIndex,
        between: Vec<CellIndex>,
        gap: u8,
        tables: Arc<LookupTables>,
    ) -> Self {
        let mut all_cells = vec![low_end, high_end];
        all_cells.extend(between.iter());
        Self {
            low_end,
            high_end,
            between,
            all_cells,
            gap,
            tables,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Lockout<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.all_cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let (lo_min, lo_max) = self.tables.min_max[grid[self.low_end].to_bits() as usize];
        let (hi_min, hi_max) = self.tables.min_max[grid[self.high_end].to_bits() as usize];

        let lower_bound = lo_min.min(hi_min);
        let upper_bound = lo_max.max(hi_max);
        if upper_bound.saturating_sub(lower_bound) < self.gap {
            return Err(Contradiction);
        }

        let mut touched = Vec::new();
        for &cell in &self.between {
            let outside = outside_range_mask(lower_bound, upper_bound, self.tables.num_values);
            let narrowed = grid[cell].intersection(&VS::from_bits(outside));
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                touched.push(cell);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

/// Values strictly less than `lower` or strictly greater than `upper`.
fn outside_range_mask(lower: u8, upper: u8, num_values: u8) -> u16 {
    let ones_to = |k: u8| if k == 0 { 0u16 } else { (1u16 << k) - 1 };
    let all = ones_to(num_values);
    let below = ones_to(lower.saturating_sub(1));
    let above = all & !ones_to(upper);
    below | above
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn whispers_excludes_close_neighbors() {
        // display value 1 (bit index 0); a neighbor differing by >= 5 can
        // only be display 6, 7, 8, or 9.
        let mut grid = vec![Mask16::from_value(0), Mask16::full(9)];
        let mut h: Whispers<Mask16> = Whispers::new(vec![0, 1], 5, 9);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(2, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        for v in 0..5 {
            assert!(grid[1].intersection(&Mask16::from_value(v)).is_empty());
        }
        for v in 5..9 {
            assert!(!grid[1].intersection(&Mask16::from_value(v)).is_empty());
        }
    }

    #[test]
    fn palindrome_pair_intersects_to_shared_values() {
        let a = Mask16::from_value(0).union(&Mask16::from_value(1));
        let b = Mask16::from_value(1).union(&Mask16::from_value(2));
        let mut grid = vec![a, b];
        let mut h: Palindrome<Mask16> = Palindrome::new(vec![(0, 1)]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(2, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::from_value(1));
        assert_eq!(grid[1], Mask16::from_value(1));
    }
}
