//! `Cage` (spec.md section 4.2): a killer-style region with a target sum and
//! an optional all-different requirement. Composed rather than reimplemented:
//! a `Sum` over the region, plus an `AllDifferent` when the cage is marked
//! distinct.

use std::sync::Arc;

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Handler, StepResult};
use crate::handlers::all_different::AllDifferent;
use crate::handlers::sum::Sum;
use crate::lookup::LookupTables;
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct Cage<VS: ValueSet> {
    sum: Sum<VS>,
    all_different: Option<AllDifferent>,
    cells: Vec<CellIndex>,
}

impl<VS: ValueSet> Cage<VS> {
    pub fn new(cells: Vec<CellIndex>, target: i64, distinct: bool, tables: Arc<LookupTables>) -> Self {
        let all_different = distinct.then(|| AllDifferent::new(cells.clone()));
        Self {
            sum: Sum::new(cells.clone(), target, tables),
            all_different,
            cells,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Cage<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn priority(&self) -> u32 {
        self.cells.len() as u32
    }

    fn exclusion_cells(&self) -> Option<Vec<CellIndex>> {
        self.all_different.as_ref().and_then(|h| h.exclusion_cells())
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        self.sum.enforce_consistency(grid, queue)?;
        if let Some(all_diff) = &mut self.all_different {
            all_diff.enforce_consistency(grid, queue)?;
        }
        Ok(())
    }
}
