//! `House` (spec.md section 4.1): a group of exactly `num_values` cells that
//! must contain every value exactly once — a row, column, box, diagonal, or
//! optimizer-synthesized jigsaw region.
//!
//! Grounded on the teacher's `HouseHandler` (`solver/handlers.rs`): the cheap
//! "have we already seen every value, or a value twice" check runs first,
//! and only falls through to the full `enforce_all_different` arc-consistency
//! pass when neither early-out applies.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::handlers::all_different::enforce_all_different;
use crate::types::{CellIndex, GridShape};
use crate::value_set::ValueSet;

pub struct House<VS: ValueSet> {
    cells: Vec<CellIndex>,
    all_values: VS,
    num_values: usize,
}

impl<VS: ValueSet> House<VS> {
    pub fn new(cells: Vec<CellIndex>, shape: &GridShape) -> Self {
        Self {
            cells,
            num_values: shape.num_values as usize,
            all_values: VS::full(shape.num_values as u8),
        }
    }
}

impl<VS: ValueSet> Handler<VS> for House<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut seen = VS::empty();
        let mut total_count = 0;

        for &cell in &self.cells {
            let v = grid[cell];
            seen.add_set(&v);
            total_count += v.count();
        }

        if !seen.equals(&self.all_values) {
            return Err(Contradiction);
        }
        if total_count == self.num_values {
            // Every value is already placed exactly once: a fixpoint.
            return Ok(());
        }

        let before: Vec<VS> = self.cells.iter().map(|&c| grid[c]).collect();
        if !enforce_all_different(grid, &self.cells) {
            return Err(Contradiction);
        }
        for (i, &cell) in self.cells.iter().enumerate() {
            if !grid[cell].equals(&before[i]) {
                queue.add_for_cell(cell);
            }
        }
        Ok(())
    }

    fn exclusion_cells(&self) -> Option<Vec<CellIndex>> {
        Some(self.cells.clone())
    }

    fn is_layout(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridShape;
    use crate::value_set::Mask16;

    fn house_of(shape: &GridShape, cells: Vec<CellIndex>) -> House<Mask16> {
        House::new(cells, shape)
    }

    #[test]
    fn fully_placed_house_is_a_fixpoint() {
        let shape = GridShape::square(2);
        let mut grid: Vec<Mask16> = (0..4).map(Mask16::from_value).collect();
        let mut house = house_of(&shape, (0..4).collect());
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![Box::new(House::new(
            (0..4).collect(),
            &shape,
        ))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(house.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn missing_value_is_a_contradiction() {
        let shape = GridShape::square(2);
        // Value 3 (bit index 3) never appears anywhere in the house.
        let mut grid = vec![
            Mask16::from_value(0),
            Mask16::from_value(1),
            Mask16::from_value(2),
            Mask16::from_value(2),
        ];
        let mut house = house_of(&shape, (0..4).collect());
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![Box::new(House::new(
            (0..4).collect(),
            &shape,
        ))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(house.enforce_consistency(&mut grid, &mut queue).is_err());
    }

    #[test]
    fn naked_single_propagates() {
        let shape = GridShape::square(2);
        let full = Mask16::full(4);
        let mut grid = vec![
            Mask16::from_value(0),
            full,
            full,
            full,
        ];
        let mut house = house_of(&shape, (0..4).collect());
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![Box::new(House::new(
            (0..4).collect(),
            &shape,
        ))];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(house.enforce_consistency(&mut grid, &mut queue).is_ok());
        for &cell in &[1, 2, 3] {
            assert!(grid[cell].intersection(&Mask16::from_value(0)).is_empty());
        }
        assert!(queue.pop().is_some());
    }
}
