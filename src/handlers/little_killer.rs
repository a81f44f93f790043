//! `LittleKiller` (spec.md section 4.2): a diagonal sum read off the grid's
//! border, optionally with non-unit coefficients (used by variants that sum
//! a diagonal "every other cell" or weight by distance from the border
//! clue). The common unit-coefficient case is a plain `Sum`; this handler
//! only adds the weighted path, narrowing by bound only (the same tradeoff
//! `PillArrow` makes, since combinatorics over weighted sums aren't
//! precomputed in `LookupTables`).

use std::sync::Arc;

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::handlers::sum::Sum;
use crate::lookup::LookupTables;
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub enum LittleKiller<VS: ValueSet> {
    Unit(Sum<VS>),
    Weighted(WeightedSum<VS>),
}

impl<VS: ValueSet> LittleKiller<VS> {
    pub fn new(cells: Vec<CellIndex>, coefficients: Vec<i64>, target: i64, tables: Arc<LookupTables>) -> Self {
        if coefficients.iter().all(|&c| c == 1) {
            LittleKiller::Unit(Sum::new(cells, target, tables))
        } else {
            LittleKiller::Weighted(WeightedSum::new(cells, coefficients, target, tables))
        }
    }
}

impl<VS: ValueSet> Handler<VS> for LittleKiller<VS> {
    fn cells(&self) -> &[CellIndex] {
        match self {
            LittleKiller::Unit(s) => s.cells(),
            LittleKiller::Weighted(s) => s.cells(),
        }
    }

    fn priority(&self) -> u32 {
        match self {
            LittleKiller::Unit(s) => s.priority(),
            LittleKiller::Weighted(s) => s.priority(),
        }
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        match self {
            LittleKiller::Unit(s) => s.enforce_consistency(grid, queue),
            LittleKiller::Weighted(s) => s.enforce_consistency(grid, queue),
        }
    }
}

pub struct WeightedSum<VS: ValueSet> {
    cells: Vec<CellIndex>,
    coefficients: Vec<i64>,
    target: i64,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> WeightedSum<VS> {
    pub fn new(cells: Vec<CellIndex>, coefficients: Vec<i64>, target: i64, tables: Arc<LookupTables>) -> Self {
        assert_eq!(cells.len(), coefficients.len());
        Self {
            cells,
            coefficients,
            target,
            tables,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for WeightedSum<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        _queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut min = 0i64;
        let mut max = 0i64;
        for (&c, &w) in self.cells.iter().zip(self.coefficients.iter()) {
            let (lo, hi) = self.tables.min_max[grid[c].to_bits() as usize];
            if w >= 0 {
                min += w * lo as i64;
                max += w * hi as i64;
            } else {
                min += w * hi as i64;
                max += w * lo as i64;
            }
        }
        if self.target < min || self.target > max {
            return Err(Contradiction);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn out_of_range_weighted_target_is_a_contradiction() {
        let tables = crate::lookup::lookup_tables(9);
        let mut grid = vec![Mask16::full(9), Mask16::full(9)];
        let mut h: LittleKiller<Mask16> =
            LittleKiller::new(vec![0, 1], vec![1, 2], 1000, tables);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(2, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_err());
    }
}
