//! `SameValues` (spec.md section 4.1): two equal-sized, disjoint cell groups
//! whose value sets must be identical. Grounded on the teacher's
//! `SameValueHandler` (`solver/handlers.rs`), which the teacher itself uses
//! only for house-intersection deductions; spec.md generalizes it to a
//! standalone handler the optimizer also reaches for in jigsaw-region
//! synthesis.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct SameValues {
    cells: Vec<CellIndex>,
    cells0: Vec<CellIndex>,
    cells1: Vec<CellIndex>,
}

impl SameValues {
    pub fn new(cells0: Vec<CellIndex>, cells1: Vec<CellIndex>) -> Self {
        let mut cells = Vec::with_capacity(cells0.len() + cells1.len());
        cells.extend(cells0.iter());
        cells.extend(cells1.iter());
        Self {
            cells,
            cells0,
            cells1,
        }
    }

    fn remove_extra_values<VS: ValueSet>(
        grid: &mut [VS],
        allowed_values: &VS,
        cells: &[CellIndex],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        for &cell in cells {
            let v = grid[cell].intersection(allowed_values);
            if v.is_empty() {
                return Err(Contradiction);
            }
            if !v.equals(&grid[cell]) {
                grid[cell] = v;
                queue.add_for_cell(cell);
            }
        }
        Ok(())
    }
}

impl<VS: ValueSet> Handler<VS> for SameValues {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let values0 = self
            .cells0
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a.union(&b))
            .unwrap();
        let values1 = self
            .cells1
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a.union(&b))
            .unwrap();

        if values0.equals(&values1) {
            return Ok(());
        }

        let values = values0.intersection(&values1);

        if (values.count()) < self.cells0.len() {
            return Err(Contradiction);
        }

        if !values0.equals(&values) {
            Self::remove_extra_values(grid, &values, &self.cells0, queue)?;
        }
        if !values1.equals(&values) {
            Self::remove_extra_values(grid, &values, &self.cells1, queue)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn identical_value_sets_is_a_fixpoint() {
        let full = Mask16::full(4);
        let mut grid = vec![full, full, full, full];
        let mut h = SameValues::new(vec![0, 1], vec![2, 3]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(SameValues::new(vec![0, 1], vec![2, 3]))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn narrower_side_constrains_the_wider_side() {
        let pair = Mask16::from_value(0).union(&Mask16::from_value(1));
        let mut grid = vec![pair, pair, Mask16::full(4), Mask16::full(4)];
        let mut h = SameValues::new(vec![0, 1], vec![2, 3]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(SameValues::new(vec![0, 1], vec![2, 3]))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[2], pair);
        assert_eq!(grid[3], pair);
    }

    #[test]
    fn too_few_shared_values_is_a_contradiction() {
        let mut grid = vec![
            Mask16::from_value(0),
            Mask16::from_value(1),
            Mask16::from_value(2),
            Mask16::from_value(3),
        ];
        let mut h = SameValues::new(vec![0, 1], vec![2, 3]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(SameValues::new(vec![0, 1], vec![2, 3]))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_err());
    }
}
