//! `HandlerSet` (spec.md sections 4.2/4.3): the full handler catalogue for
//! one solve, partitioned into essential (from constraint resolution) and
//! auxiliary (optimizer-synthesized) handlers, plus the top-level propagate
//! loop. Grounded on the teacher's `solver/handlers.rs::enforce_constraints`
//! and `HandlerSet`, generalized from a fixed two-variant enum to
//! `Box<dyn Handler<VS>>`.

use crate::accumulator::HandlerAccumulator;
use crate::exclusions::CellExclusions;
use crate::handler::{Handler, HandlerKind, StepResult};
use crate::types::{CellIndex, GridShape};
use crate::value_set::ValueSet;

pub struct HandlerSet<VS: ValueSet> {
    handlers: Vec<Box<dyn Handler<VS>>>,
    essential: Vec<bool>,
}

impl<VS: ValueSet> HandlerSet<VS> {
    /// Builds from the essential handlers constraint resolution produced.
    /// Singleton-kind handlers are stably sorted to the front: seeded with
    /// `enqueue_all`, this drains them before any ordinary handler runs for
    /// the same cell (spec.md section 4.1's singleton-first invariant).
    pub fn new(mut handlers: Vec<Box<dyn Handler<VS>>>) -> Self {
        handlers.sort_by_key(|h| match h.kind() {
            HandlerKind::Singleton => 0,
            HandlerKind::Ordinary => 1,
        });
        let essential = vec![true; handlers.len()];
        Self { handlers, essential }
    }

    /// Appends an optimizer-synthesized handler (spec.md section 4.3),
    /// tagged non-essential.
    pub fn push_auxiliary(&mut self, handler: Box<dyn Handler<VS>>) {
        self.handlers.push(handler);
        self.essential.push(false);
    }

    pub fn handlers(&self) -> &[Box<dyn Handler<VS>>] {
        &self.handlers
    }

    pub fn is_essential(&self, index: usize) -> bool {
        self.essential[index]
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every cell group any handler reports via `exclusion_cells()`, for
    /// `CellExclusions::build`.
    pub fn exclusion_groups(&self) -> Vec<Vec<CellIndex>> {
        self.handlers.iter().filter_map(|h| h.exclusion_cells()).collect()
    }

    /// Runs every handler's `initialize` in order. A handler that reports a
    /// contradiction short-circuits the rest.
    pub fn initialize_all(
        &mut self,
        grid: &mut [VS],
        exclusions: &CellExclusions,
        shape: &GridShape,
    ) -> StepResult {
        for handler in &mut self.handlers {
            handler.initialize(grid, exclusions, shape)?;
        }
        Ok(())
    }

    /// Runs every handler's read-only `post_initialize`, once the grid has
    /// reached its first fixpoint.
    pub fn post_initialize_all(&mut self, grid: &[VS]) {
        for handler in &mut self.handlers {
            handler.post_initialize(grid);
        }
    }

    pub fn new_accumulator(&self, num_cells: usize) -> HandlerAccumulator {
        HandlerAccumulator::new(num_cells, &self.handlers)
    }

    /// Seeds every handler into `queue` in descending index order, so
    /// ascending indices (and thus, per `new`'s sort, singleton-kind
    /// handlers) end up at the front of the accumulator's LIFO work-queue.
    pub fn enqueue_all(&self, queue: &mut HandlerAccumulator) {
        for i in (0..self.handlers.len()).rev() {
            queue.add(i);
        }
    }

    /// Drains `queue` to a fixpoint: pop a handler, hold it so its own
    /// re-entrant `add` calls are no-ops, run it, release the hold. Matches
    /// the teacher's `enforce_constraints`.
    pub fn enforce(&mut self, grid: &mut [VS], queue: &mut HandlerAccumulator) -> StepResult {
        self.enforce_filtered(grid, queue, |_| true)
    }

    /// As `enforce`, but a handler is skipped (popped and discarded without
    /// running) unless `allow` accepts it. Used by `validateLayout` (spec.md
    /// section 4.4) to run only layout handlers.
    pub fn enforce_filtered(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
        allow: impl Fn(&dyn Handler<VS>) -> bool,
    ) -> StepResult {
        while let Some(index) = queue.pop() {
            if !allow(self.handlers[index].as_ref()) {
                continue;
            }
            queue.hold(index);
            self.handlers[index].enforce_consistency(grid, queue).map_err(|e| {
                queue.clear();
                e
            })?;
            queue.clear_hold();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::given::GivenCandidates;
    use crate::handlers::house::House;
    use crate::types::GridShape;
    use crate::value_set::Mask16;

    fn shape() -> GridShape {
        GridShape::square(2)
    }

    #[test]
    fn enforce_reaches_a_fixpoint_across_handlers() {
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![
            Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(0)])),
            Box::new(House::<Mask16>::new(vec![0, 1, 2, 3], &shape())),
        ];
        let mut handler_set = HandlerSet::new(handlers);
        let mut grid = vec![Mask16::full(4); 4];
        let mut queue = handler_set.new_accumulator(4);
        handler_set.enqueue_all(&mut queue);
        assert!(handler_set.enforce(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::from_value(0));
    }

    #[test]
    fn singleton_handlers_sort_ahead_of_ordinary_ones() {
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![
            Box::new(House::<Mask16>::new(vec![0, 1, 2, 3], &shape())),
            Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(0)])),
        ];
        let handler_set = HandlerSet::new(handlers);
        assert_eq!(handler_set.handlers()[0].kind(), crate::handler::HandlerKind::Singleton);
    }

    #[test]
    fn exclusion_groups_collects_every_handler_that_reports_them() {
        let handlers: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(House::<Mask16>::new(vec![0, 1, 2, 3], &shape()))];
        let handler_set = HandlerSet::new(handlers);
        assert_eq!(handler_set.exclusion_groups(), vec![vec![0, 1, 2, 3]]);
    }
}
