//! `GivenCandidates` (spec.md section 4.2): the SINGLETON_HANDLER that seeds
//! a cell's initial candidate mask from externally supplied data. Ungrouped
//! with other singleton handlers by `kind()`; the propagation loop drains
//! every singleton handler on a cell before any ordinary handler runs for it.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, HandlerKind, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct GivenCandidates<VS: ValueSet> {
    cells: Vec<CellIndex>,
    masks: Vec<VS>,
}

impl<VS: ValueSet> GivenCandidates<VS> {
    pub fn new(cells: Vec<CellIndex>, masks: Vec<VS>) -> Self {
        assert_eq!(cells.len(), masks.len());
        Self { cells, masks }
    }
}

impl<VS: ValueSet> Handler<VS> for GivenCandidates<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Singleton
    }

    fn is_layout(&self) -> bool {
        true
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        for (&cell, &mask) in self.cells.iter().zip(self.masks.iter()) {
            let narrowed = grid[cell].intersection(&mask);
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                queue.add_for_cell(cell);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn narrows_to_the_given_mask() {
        let mut grid = vec![Mask16::full(4)];
        let mut h = GivenCandidates::new(vec![0], vec![Mask16::from_value(2)]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(2)]))];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::from_value(2));
        assert!(queue.pop().is_some());
    }

    #[test]
    fn disjoint_given_is_a_contradiction() {
        let mut grid = vec![Mask16::from_value(0)];
        let mut h = GivenCandidates::new(vec![0], vec![Mask16::from_value(1)]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(1)]))];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_err());
    }

    #[test]
    fn second_run_with_no_change_is_a_silent_fixpoint() {
        let mut grid = vec![Mask16::from_value(2)];
        let mut h = GivenCandidates::new(vec![0], vec![Mask16::from_value(2)]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(2)]))];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert!(queue.pop().is_none());
    }
}
