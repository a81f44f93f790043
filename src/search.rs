//! The search driver (spec.md section 4.4): depth-first search over the
//! candidate grid with a grid stack, priority/MRV cell selection, and the
//! driver's solve modes (`nthSolution`, `countSolutions`,
//! `solveAllPossibilities`, `validateLayout`). Grounded on the teacher's
//! `solver/engine.rs` `Engine` (grid-stack/rec-stack/progress-ratio-stack
//! mechanics, `record_backtrack`, `skip_fixed_cells`, cooperative progress
//! callback), generalized from the teacher's fixed handler-kind dispatch to a
//! `Box<dyn Handler<VS>>`-backed `HandlerSet` and the priority-aware
//! `Selector`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler};
use crate::handler_set::HandlerSet;
use crate::selector::Selector;
use crate::types::{CellIndex, CellValue, FixedValues, GridShape, Solution, ValueType};
use crate::value_set::ValueSet;

/// Externally settable cancellation flag (spec.md section 5's `terminate()`):
/// polled at every node and at the start of each propagation pass.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Counters {
    pub values_tried: u64,
    pub cells_searched: u64,
    pub backtracks: u64,
    pub guesses: u64,
    pub solutions: u64,
    pub constraints_processed: u64,
    pub progress_ratio: f64,
}

pub type ProgressCallback = dyn FnMut(&Counters);

struct ProgressReporter {
    callback: Option<Box<ProgressCallback>>,
    frequency_mask: u64,
}

impl ProgressReporter {
    fn new(callback: Option<Box<ProgressCallback>>, log_update_frequency: u64) -> Self {
        let frequency_mask = log_update_frequency.next_power_of_two().saturating_sub(1).max(1);
        Self { callback, frequency_mask }
    }

    fn maybe_call(&mut self, counters: &Counters) {
        if let Some(cb) = &mut self.callback {
            cb(counters);
        }
    }

    fn maybe_call_throttled(&mut self, guesses: u64, counters: &Counters) {
        if guesses & self.frequency_mask == 0 {
            self.maybe_call(counters);
        }
    }
}

/// Whether a run ended because the grid was exhausted or because it was
/// cancelled mid-search (spec.md section 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exhausted,
    Cancelled,
}

/// Per-cell priority boost, `max` over every handler touching that cell of
/// `Handler::priority()` (spec.md section 4.4 step 2a).
fn cell_priorities<VS: ValueSet>(handler_set: &HandlerSet<VS>, num_cells: usize) -> Vec<u32> {
    let mut priorities = vec![0u32; num_cells];
    for handler in handler_set.handlers() {
        let p = handler.priority();
        for &cell in handler.cells() {
            if p > priorities[cell] {
                priorities[cell] = p;
            }
        }
    }
    priorities
}

/// The depth-first search engine. Owns the grid stack, the handler set, and
/// every piece of per-solve mutable state; the solve-mode free functions
/// below drive it by repeatedly calling `advance`.
pub struct SearchEngine<VS: ValueSet> {
    started: bool,
    cell_order: Vec<CellIndex>,
    rec_stack: Vec<usize>,
    grid_stack: Vec<Vec<VS>>,
    handler_set: HandlerSet<VS>,
    queue: HandlerAccumulator,
    priorities: Vec<u32>,
    backtrack_triggers: Vec<u32>,
    progress_ratio_stack: Vec<f64>,
    counters: Counters,
    cancel: CancelToken,
    progress: ProgressReporter,
    layout_only: bool,
}

impl<VS: ValueSet> SearchEngine<VS> {
    pub fn new(
        shape: &GridShape,
        fixed_values: &FixedValues,
        handler_set: HandlerSet<VS>,
        cancel: CancelToken,
        progress_callback: Option<Box<ProgressCallback>>,
        log_update_frequency: u64,
    ) -> Self {
        let num_cells = shape.num_cells;
        let full_cell = VS::full(shape.num_values as ValueType);

        let mut grid = vec![full_cell; num_cells];
        for (cell, value) in fixed_values {
            grid[*cell] = VS::from_value(value.index());
        }

        let priorities = cell_priorities(&handler_set, num_cells);
        let queue = handler_set.new_accumulator(num_cells);

        Self {
            started: false,
            cell_order: (0..num_cells).collect(),
            rec_stack: Vec::with_capacity(num_cells),
            grid_stack: vec![grid],
            handler_set,
            queue,
            priorities,
            backtrack_triggers: vec![0; num_cells],
            progress_ratio_stack: vec![1.0; num_cells + 1],
            counters: Counters::default(),
            cancel,
            progress: ProgressReporter::new(progress_callback, log_update_frequency),
            layout_only: false,
        }
    }

    /// Restricts propagation to layout handlers only (spec.md section 4.4's
    /// `validateLayout`). Must be set before the first call to `advance`.
    pub fn set_layout_only(&mut self, layout_only: bool) {
        self.layout_only = layout_only;
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    fn num_cells(&self) -> usize {
        self.cell_order.len()
    }

    fn grid_index(&self) -> usize {
        self.rec_stack.len()
    }

    fn enforce_consistency(&mut self) -> Result<(), Contradiction> {
        self.counters.constraints_processed += 1;
        let grid_index = self.grid_index();
        let grid = &mut self.grid_stack[grid_index];
        let queue = &mut self.queue;
        if self.layout_only {
            self.handler_set.enforce_filtered(grid, queue, |h| h.is_layout())
        } else {
            self.handler_set.enforce(grid, queue)
        }
    }

    // Copies grid_stack[grid_index] -> grid_stack[grid_index+1], growing the
    // stack if this is the deepest frame seen so far.
    fn push_grid_onto_stack(&mut self) {
        let grid_index = self.grid_index();
        if self.grid_stack.len() == grid_index + 1 {
            self.grid_stack.extend_from_within(grid_index..);
        } else {
            let (front, back) = self.grid_stack.split_at_mut(grid_index + 1);
            back[0].copy_from_slice(&front[grid_index]);
        }
    }

    fn record_backtrack(&mut self, cell: CellIndex) {
        const BACKTRACK_DECAY_INTERVAL: u64 = 50;
        self.counters.backtracks += 1;
        if 0 == self.counters.backtracks % BACKTRACK_DECAY_INTERVAL {
            for bt in &mut self.backtrack_triggers {
                *bt >>= 1;
            }
        }
        self.backtrack_triggers[cell] += 1;
    }

    fn skip_fixed_cells(&mut self, start_cell_index: usize) -> usize {
        let grid_index = self.grid_index();
        let cell_order = &mut self.cell_order;
        let grid = &self.grid_stack[grid_index];

        let mut cell_index = start_cell_index;
        for i in start_cell_index..cell_order.len() {
            let cell = cell_order[i];
            if !grid[cell].has_multiple() {
                cell_order.swap(i, cell_index);
                cell_index += 1;
                self.counters.values_tried += 1;
            }
        }
        cell_index
    }

    /// Runs the DFS until the next solution is found, the search is
    /// exhausted, or it is cancelled. Returns the depth of the grid holding
    /// the solution (spec.md section 4.4's step algorithm 1-6).
    fn advance(&mut self) -> Result<usize, RunOutcome> {
        let mut new_cell_index = false;
        let mut progress_delta = 1.0;
        let num_cells = self.num_cells();

        if !self.started {
            self.started = true;
            self.progress.maybe_call(&self.counters);

            self.queue.clear();
            self.handler_set.enqueue_all(&mut self.queue);
            if self.enforce_consistency().is_ok() {
                let cell_index = self.skip_fixed_cells(0);
                self.rec_stack.push(cell_index);
                new_cell_index = true;
            }
            self.progress.maybe_call(&self.counters);
        }

        while let Some(mut cell_index) = self.rec_stack.pop() {
            if self.cancel.is_cancelled() {
                self.rec_stack.push(cell_index);
                return Err(RunOutcome::Cancelled);
            }

            let grid_index = self.grid_index();

            if new_cell_index {
                new_cell_index = false;
                cell_index = self.skip_fixed_cells(cell_index);

                if cell_index == num_cells {
                    self.counters.solutions += 1;
                    self.counters.progress_ratio += progress_delta;
                    self.progress.maybe_call(&self.counters);
                    return Ok(grid_index);
                }

                Selector::pick(
                    &self.grid_stack[grid_index],
                    &mut self.cell_order,
                    cell_index,
                    &self.priorities,
                    &self.backtrack_triggers,
                    None,
                );
                let count = self.grid_stack[grid_index][self.cell_order[cell_index]].count();
                self.progress_ratio_stack[grid_index] = progress_delta / (count as f64);
                self.counters.cells_searched += 1;
            }
            progress_delta = self.progress_ratio_stack[grid_index];

            let cell = self.cell_order[cell_index];
            self.counters.values_tried += 1;

            // Every branch copies the grid onto a fresh stack frame rather
            // than mutating the last candidate in place, so a cancelled or
            // paused search can always be resumed from `rec_stack` without
            // having clobbered a frame a sibling value still needs.
            let was_forced = !self.grid_stack[grid_index][cell].has_multiple();
            let v = match self.grid_stack[grid_index][cell].pop() {
                Some(v) => v,
                None => continue,
            };

            self.push_grid_onto_stack();
            self.rec_stack.push(cell_index);
            if !was_forced {
                self.counters.guesses += 1;
                self.progress
                    .maybe_call_throttled(self.counters.guesses, &self.counters);
            }

            self.grid_stack[grid_index + 1][cell] = VS::from_value(v);

            self.queue.clear();
            self.queue.add_for_cell(cell);
            self.counters.constraints_processed += 1;
            let result = {
                let grid = &mut self.grid_stack[grid_index + 1];
                let queue = &mut self.queue;
                if self.layout_only {
                    self.handler_set.enforce_filtered(grid, queue, |h| h.is_layout())
                } else {
                    self.handler_set.enforce(grid, queue)
                }
            };

            match result {
                Ok(()) => {
                    self.rec_stack.push(cell_index + 1);
                    new_cell_index = true;
                }
                Err(Contradiction) => {
                    self.counters.progress_ratio += progress_delta;
                    self.record_backtrack(cell);
                }
            }
        }

        self.progress.maybe_call(&self.counters);
        Err(RunOutcome::Exhausted)
    }

    fn current_solution(&self, grid_index: usize) -> Solution {
        self.grid_stack[grid_index]
            .iter()
            .map(|vs| {
                CellValue::from_index(
                    vs.value()
                        .unwrap_or_else(|| panic!("solution grid has an unfixed cell: {:?}", vs)),
                )
            })
            .collect()
    }
}

/// `nthSolution(n)` (spec.md section 4.4): the `n`-th accepted solution
/// (0-indexed), or `None` if the search exhausts or is cancelled first.
pub fn nth_solution<VS: ValueSet>(engine: &mut SearchEngine<VS>, n: u64) -> Option<Solution> {
    loop {
        match engine.advance() {
            Ok(grid_index) => {
                if engine.counters.solutions - 1 == n {
                    return Some(engine.current_solution(grid_index));
                }
            }
            Err(_) => return None,
        }
    }
}

/// `countSolutions()` (spec.md section 4.4): runs to exhaustion and returns
/// the total solution count, or `None` if cancelled first.
pub fn count_solutions<VS: ValueSet>(engine: &mut SearchEngine<VS>) -> Option<u64> {
    loop {
        match engine.advance() {
            Ok(_) => continue,
            Err(RunOutcome::Exhausted) => return Some(engine.counters.solutions),
            Err(RunOutcome::Cancelled) => return None,
        }
    }
}

/// `solveAllPossibilities()` (spec.md section 4.4): the union of every value
/// that appears in at least one solution, per cell. Does not implement the
/// spec's "a bit already present need not be re-explored" short-circuit —
/// every solution is still enumerated in full; see DESIGN.md.
pub fn solve_all_possibilities<VS: ValueSet>(engine: &mut SearchEngine<VS>) -> Option<Vec<VS>> {
    let num_cells = engine.num_cells();
    let mut accumulated = vec![VS::empty(); num_cells];
    loop {
        match engine.advance() {
            Ok(grid_index) => {
                for (cell, mask) in accumulated.iter_mut().enumerate() {
                    mask.add_set(&engine.grid_stack[grid_index][cell]);
                }
            }
            Err(RunOutcome::Exhausted) => return Some(accumulated),
            Err(RunOutcome::Cancelled) => return None,
        }
    }
}

/// `validateLayout()` (spec.md section 4.4): like `nthSolution(0)` but with
/// every non-layout handler disabled, so only the grid's uniqueness
/// structure (houses, all-different groups, givens) is checked.
pub fn validate_layout<VS: ValueSet>(engine: &mut SearchEngine<VS>) -> Option<bool> {
    engine.set_layout_only(true);
    match engine.advance() {
        Ok(_) => Some(true),
        Err(RunOutcome::Exhausted) => Some(false),
        Err(RunOutcome::Cancelled) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::house::House;
    use crate::handlers::sum::Sum;
    use crate::lookup::lookup_tables;
    use crate::value_set::Mask16;

    fn shape() -> GridShape {
        GridShape::square(2)
    }

    fn latin_square_handlers(shape: &GridShape) -> HandlerSet<Mask16> {
        let mut handlers: Vec<Box<dyn Handler<Mask16>>> = Vec::new();
        for row in 0..shape.num_rows {
            let cells = (0..shape.num_cols).map(|c| shape.make_cell_index(row, c)).collect();
            handlers.push(Box::new(House::<Mask16>::new(cells, shape)));
        }
        for col in 0..shape.num_cols {
            let cells = (0..shape.num_rows).map(|r| shape.make_cell_index(r, col)).collect();
            handlers.push(Box::new(House::<Mask16>::new(cells, shape)));
        }
        HandlerSet::new(handlers)
    }

    #[test]
    fn finds_the_unique_solution_of_a_fully_given_grid() {
        let shape = shape();
        let handlers = latin_square_handlers(&shape);
        let fixed = vec![
            (0, CellValue::from_display_value(1)),
            (1, CellValue::from_display_value(2)),
            (2, CellValue::from_display_value(2)),
            (3, CellValue::from_display_value(1)),
        ];
        let mut engine = SearchEngine::<Mask16>::new(
            &shape,
            &fixed,
            handlers,
            CancelToken::new(),
            None,
            1 << 14,
        );
        let solution = nth_solution(&mut engine, 0).expect("a solution should exist");
        assert_eq!(solution[0].display_value(), 1);
        assert_eq!(solution[3].display_value(), 1);
    }

    #[test]
    fn counts_all_solutions_of_an_empty_two_by_two_grid() {
        let shape = shape();
        let handlers = latin_square_handlers(&shape);
        let mut engine =
            SearchEngine::<Mask16>::new(&shape, &Vec::new(), handlers, CancelToken::new(), None, 1 << 14);
        // A 2x2 Latin square over {1,2} has exactly 2 solutions.
        assert_eq!(count_solutions(&mut engine), Some(2));
    }

    #[test]
    fn all_possibilities_unions_every_solutions_values() {
        let shape = shape();
        let handlers = latin_square_handlers(&shape);
        let mut engine =
            SearchEngine::<Mask16>::new(&shape, &Vec::new(), handlers, CancelToken::new(), None, 1 << 14);
        let possibilities = solve_all_possibilities(&mut engine).unwrap();
        for mask in possibilities {
            assert_eq!(mask, Mask16::full(2));
        }
    }

    #[test]
    fn cancellation_is_reported_instead_of_a_solution() {
        let shape = shape();
        let handlers = latin_square_handlers(&shape);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut engine =
            SearchEngine::<Mask16>::new(&shape, &Vec::new(), handlers, cancel, None, 1 << 14);
        assert_eq!(nth_solution(&mut engine, 0), None);
    }

    #[test]
    fn validate_layout_ignores_an_unsatisfiable_sum() {
        // A Sum with an unreachable target over two cells of a 2x2 grid: an
        // ordinary solve must contradict, but `validateLayout` disables it
        // and finds the houses alone satisfiable.
        let shape = shape();

        let sum_handlers = |shape: &GridShape| {
            let mut handlers = latin_square_handlers(shape);
            handlers.push_auxiliary(Box::new(Sum::new(vec![0, 1], 999, lookup_tables(2))));
            handlers
        };

        let mut plain_engine = SearchEngine::<Mask16>::new(
            &shape,
            &Vec::new(),
            sum_handlers(&shape),
            CancelToken::new(),
            None,
            1 << 14,
        );
        assert_eq!(count_solutions(&mut plain_engine), Some(0));

        let mut engine = SearchEngine::<Mask16>::new(
            &shape,
            &Vec::new(),
            sum_handlers(&shape),
            CancelToken::new(),
            None,
            1 << 14,
        );
        assert_eq!(validate_layout(&mut engine), Some(true));
    }
}
