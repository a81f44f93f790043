//! The public façade (spec.md section 6): wires constraint resolution
//! (`constraint.rs`), the optimizer, and the search driver behind a single
//! `Solver` type and its solve-mode methods. Grounded on the teacher's
//! `engine.rs`/`runner.rs` `Config`/`Counters`/`ProgressCallback` pattern —
//! referenced but not present verbatim in the retrieved `solver/mod.rs`, so
//! rebuilt here to match every call site those two files make against it.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::constraint::ConstraintSpec;
use crate::error::EngineError;
use crate::handler_set::HandlerSet;
use crate::optimizer::Optimizer;
use crate::search::{
    count_solutions, nth_solution, solve_all_possibilities, validate_layout, CancelToken, Counters,
    SearchEngine,
};
use crate::types::{FixedValues, GridShape, Solution};
use crate::value_set::ValueSet;

/// Mode-specific payload a state snapshot's `extra` field carries (spec.md
/// section 6.3).
pub enum SnapshotExtra<VS: ValueSet> {
    None,
    SampleSolution(Solution),
    Pencilmarks(Vec<VS>),
}

/// What every progress/termination callback receives (spec.md section 6.3):
/// the running counters, elapsed wall-clock time, whether the driver has
/// exhausted search, and a mode-specific extra. A host-facing concept built
/// at the façade layer: the lower-level `SearchEngine` only ever pushes raw
/// counters mid-search (it has no notion of "done" beyond its own
/// `RunOutcome`), so `Solver` adapts that stream and appends one final,
/// `done = true` call once a solve-mode method actually returns.
pub struct StateSnapshot<VS: ValueSet> {
    pub counters: Counters,
    pub time_ms: u64,
    pub done: bool,
    pub extra: SnapshotExtra<VS>,
}

pub type SnapshotCallback<VS> = dyn FnMut(&StateSnapshot<VS>);

/// Wraps a host's `SnapshotCallback` into the raw `FnMut(&Counters)` the
/// search engine calls mid-search, stamping every intermediate call with
/// `done = false` and `extra = None`. Kept as an `Rc<RefCell<_>>` so the
/// solve-mode method can still reach the same callback afterward to fire
/// the terminal `done = true` snapshot.
fn adapt_callback<VS: ValueSet + 'static>(
    callback: Option<Box<SnapshotCallback<VS>>>,
    start: Instant,
) -> (
    Option<Box<crate::search::ProgressCallback>>,
    Option<Rc<RefCell<Box<SnapshotCallback<VS>>>>>,
) {
    match callback {
        None => (None, None),
        Some(cb) => {
            let shared = Rc::new(RefCell::new(cb));
            let for_engine = shared.clone();
            let wrapped: Box<crate::search::ProgressCallback> = Box::new(move |counters: &Counters| {
                (for_engine.borrow_mut())(&StateSnapshot {
                    counters: *counters,
                    time_ms: start.elapsed().as_millis() as u64,
                    done: false,
                    extra: SnapshotExtra::None,
                });
            });
            (Some(wrapped), Some(shared))
        }
    }
}

fn fire_done<VS: ValueSet>(
    callback: &Option<Rc<RefCell<Box<SnapshotCallback<VS>>>>>,
    counters: Counters,
    start: Instant,
    extra: SnapshotExtra<VS>,
) {
    if let Some(cb) = callback {
        (cb.borrow_mut())(&StateSnapshot {
            counters,
            time_ms: start.elapsed().as_millis() as u64,
            done: true,
            extra,
        });
    }
}

/// Search driver tunables (spec.md section 5), collected the way the
/// teacher's `Config` gathers `engine.rs`/`runner.rs`'s free-standing
/// parameters into one struct. Builder-style with `Default`.
#[derive(Clone)]
pub struct Config {
    /// How often (in guesses) the progress callback fires; `1` calls it on
    /// every guess. Matches spec.md section 5's `logUpdateFrequency`.
    pub log_update_frequency: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_update_frequency: 1 << 10,
        }
    }
}

impl Config {
    pub fn with_log_update_frequency(mut self, frequency: u64) -> Self {
        self.log_update_frequency = frequency;
        self
    }
}

/// A single resolved puzzle, holding the fully built and optimizer-enriched
/// handler catalogue plus grid geometry/givens. Spawns one `SearchEngine`
/// per call to a solve-mode method; `Handler` trait objects aren't `Clone`,
/// so a `Solver` is consumed by the first solve it drives, matching how the
/// teacher's own `Runner`/`Engine` pair is built once per run rather than
/// reused across independent searches.
pub struct Solver<VS: ValueSet> {
    shape: GridShape,
    fixed_values: FixedValues,
    handler_set: HandlerSet<VS>,
    config: Config,
}

impl<VS: ValueSet + 'static> Solver<VS> {
    /// Resolves `spec` into a handler catalogue, runs the optimizer over it,
    /// and returns a façade ready to drive a solve mode. Fails only when the
    /// resolved tree is internally inconsistent in a way that indicates an
    /// engine bug (spec.md section 7) rather than an ordinary unsatisfiable
    /// puzzle — an out-of-range given, for instance, or a grid wider than
    /// the 16-value bit ceiling.
    pub fn new(spec: ConstraintSpec, config: Config) -> Result<Self, EngineError> {
        let shape = spec.shape;
        if shape.num_values > 16 {
            return Err(EngineError::ValuesExceedBitCeiling(shape.num_values));
        }
        for &(cell, value) in &spec.fixed_values {
            if cell >= shape.num_cells {
                return Err(EngineError::MalformedCellList(format!(
                    "given references out-of-range cell {cell}"
                )));
            }
            if value.index() as u32 >= shape.num_values {
                return Err(EngineError::ValueOutOfRange {
                    value: value.display_value() as u32,
                    num_values: shape.num_values as u8,
                });
            }
        }

        let resolved = spec.resolve::<VS>();
        let tables = crate::lookup::lookup_tables(resolved.shape.shape.num_values as u8);

        let mut handler_set = HandlerSet::new(resolved.handlers);
        Optimizer::run(
            &resolved.shape.shape,
            &resolved.houses,
            &resolved.sums,
            tables,
            &mut handler_set,
        );

        // Surfaces a resolver-bug contradiction (e.g. two givens the
        // resolver itself placed in direct conflict) as an `EngineError` up
        // front, rather than only as an empty solution set once a solve mode
        // runs. Uses a throwaway grid purely for this probe.
        let shape_copy = resolved.shape.shape;
        let mut probe_grid = crate::grid::full_grid(shape_copy.num_cells, shape_copy.num_values as crate::types::ValueType);
        let exclusions = crate::exclusions::CellExclusions::build(
            shape_copy.num_cells,
            &handler_set.exclusion_groups(),
        );
        if handler_set
            .initialize_all(&mut probe_grid, &exclusions, &shape_copy)
            .is_err()
        {
            return Err(EngineError::MalformedCellList(
                "resolved constraint tree contradicts itself before any guess is made".into(),
            ));
        }
        handler_set.post_initialize_all(&probe_grid);

        Ok(Self {
            shape: shape_copy,
            fixed_values: resolved.shape.fixed_values,
            handler_set,
            config,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn fixed_values(&self) -> &FixedValues {
        &self.fixed_values
    }

    fn into_engine(
        self,
        cancel: CancelToken,
        progress_callback: Option<Box<crate::search::ProgressCallback>>,
    ) -> SearchEngine<VS> {
        SearchEngine::new(
            &self.shape,
            &self.fixed_values,
            self.handler_set,
            cancel,
            progress_callback,
            self.config.log_update_frequency,
        )
    }

    /// `nthSolution(n)` (spec.md section 4.4).
    pub fn nth_solution(
        self,
        n: u64,
        cancel: CancelToken,
        progress_callback: Option<Box<SnapshotCallback<VS>>>,
    ) -> Option<Solution> {
        let start = Instant::now();
        let (engine_cb, shared) = adapt_callback(progress_callback, start);
        let mut engine = self.into_engine(cancel, engine_cb);
        let result = nth_solution(&mut engine, n);
        let extra = match &result {
            Some(solution) => SnapshotExtra::SampleSolution(solution.clone()),
            None => SnapshotExtra::None,
        };
        fire_done(&shared, *engine.counters(), start, extra);
        result
    }

    /// `countSolutions()` (spec.md section 4.4).
    pub fn count_solutions(
        self,
        cancel: CancelToken,
        progress_callback: Option<Box<SnapshotCallback<VS>>>,
    ) -> Option<u64> {
        let start = Instant::now();
        let (engine_cb, shared) = adapt_callback(progress_callback, start);
        let mut engine = self.into_engine(cancel, engine_cb);
        let result = count_solutions(&mut engine);
        fire_done(&shared, *engine.counters(), start, SnapshotExtra::None);
        result
    }

    /// `solveAllPossibilities()` (spec.md section 4.4).
    pub fn solve_all_possibilities(
        self,
        cancel: CancelToken,
        progress_callback: Option<Box<SnapshotCallback<VS>>>,
    ) -> Option<Vec<VS>> {
        let start = Instant::now();
        let (engine_cb, shared) = adapt_callback(progress_callback, start);
        let mut engine = self.into_engine(cancel, engine_cb);
        let result = solve_all_possibilities(&mut engine);
        let counters = *engine.counters();
        match result {
            Some(pencilmarks) => {
                fire_done(&shared, counters, start, SnapshotExtra::Pencilmarks(pencilmarks.clone()));
                Some(pencilmarks)
            }
            None => {
                fire_done(&shared, counters, start, SnapshotExtra::None);
                None
            }
        }
    }

    /// `validateLayout()` (spec.md section 4.4).
    pub fn validate_layout(
        self,
        cancel: CancelToken,
        progress_callback: Option<Box<SnapshotCallback<VS>>>,
    ) -> Option<bool> {
        let start = Instant::now();
        let (engine_cb, shared) = adapt_callback(progress_callback, start);
        let mut engine = self.into_engine(cancel, engine_cb);
        let result = validate_layout(&mut engine);
        fire_done(&shared, *engine.counters(), start, SnapshotExtra::None);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Node;
    use crate::types::CellValue;
    use crate::value_set::Mask16;

    fn classic_shape() -> GridShape {
        GridShape::square(2)
    }

    fn spec(nodes: Vec<Node>) -> ConstraintSpec {
        ConstraintSpec {
            shape: classic_shape(),
            fixed_values: Vec::new(),
            sudoku_x: false,
            no_boxes: false,
            nodes,
        }
    }

    #[test]
    fn rejects_a_given_outside_the_grid() {
        let mut s = spec(Vec::new());
        s.fixed_values = vec![(99, CellValue::from_display_value(1))];
        let result = Solver::<Mask16>::new(s, Config::default());
        assert!(matches!(result, Err(EngineError::MalformedCellList(_))));
    }

    #[test]
    fn rejects_a_value_out_of_range() {
        let mut s = spec(Vec::new());
        s.fixed_values = vec![(0, CellValue::from_display_value(9))];
        let result = Solver::<Mask16>::new(s, Config::default());
        assert!(matches!(result, Err(EngineError::ValueOutOfRange { .. })));
    }

    #[test]
    fn builds_successfully_for_a_satisfiable_spec() {
        let s = spec(Vec::new());
        assert!(Solver::<Mask16>::new(s, Config::default()).is_ok());
    }

    #[test]
    fn solves_a_fully_given_two_by_two_grid() {
        let fixed = vec![
            (0, CellValue::from_display_value(1)),
            (1, CellValue::from_display_value(2)),
            (2, CellValue::from_display_value(2)),
            (3, CellValue::from_display_value(1)),
        ];
        let mut s = spec(Vec::new());
        s.fixed_values = fixed;
        let solver = Solver::<Mask16>::new(s, Config::default()).unwrap();
        let solution = solver
            .nth_solution(0, CancelToken::new(), None)
            .expect("a solution should exist");
        assert_eq!(solution[0].display_value(), 1);
    }
}
