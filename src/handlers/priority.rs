//! `Priority` (spec.md section 4.2): a non-enforcing handler that boosts the
//! candidate-selector's branch priority for a cell set. It has no
//! consistency pass at all — `priority()` is the only thing read, by
//! `selector.rs`.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct Priority {
    cells: Vec<CellIndex>,
    boost: u32,
}

impl Priority {
    pub fn new(cells: Vec<CellIndex>, boost: u32) -> Self {
        Self { cells, boost }
    }
}

impl<VS: ValueSet> Handler<VS> for Priority {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn priority(&self) -> u32 {
        self.boost
    }

    fn enforce_consistency(
        &mut self,
        _grid: &mut [VS],
        _queue: &mut HandlerAccumulator,
    ) -> StepResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn never_narrows_or_enqueues() {
        let mut grid = vec![Mask16::full(4)];
        let mut h = Priority::new(vec![0], 99);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(Handler::<Mask16>::enforce_consistency(&mut h, &mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::full(4));
        assert_eq!(<Priority as Handler<Mask16>>::priority(&h), 99);
    }
}
