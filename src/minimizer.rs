//! Puzzle minimization (SPEC_FULL.md section C): given a solvable
//! constraint, produce an iterator of increasingly-reduced `FixedValues`
//! sets that each still yield a unique solution. Grounded on the teacher's
//! `solver/minimizer.rs`, rebuilt on top of the façade's public
//! `Solver::new`/`nth_solution` instead of reaching into `Runner`
//! internals, so it stays a consumer of the core rather than an extension
//! of its contract.

use crate::constraint::ConstraintSpec;
use crate::search::CancelToken;
use crate::solver::{Config, Solver};
use crate::types::FixedValues;
use crate::value_set::ValueSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizerCounters {
    pub cells_tried: u64,
    pub cells_removed: u64,
}

/// Whether a candidate `FixedValues` set, once re-solved, still pins down
/// exactly one solution.
fn is_unique<VS: ValueSet + 'static>(spec: ConstraintSpec, config: &Config) -> bool {
    let Ok(solver) = Solver::<VS>::new(spec.clone(), config.clone()) else {
        return false;
    };
    if solver.nth_solution(0, CancelToken::new(), None).is_none() {
        // No solution at all: the removed clue was load-bearing (or the
        // puzzle was already inconsistent), but either way this candidate
        // set isn't "a puzzle with exactly one solution".
        return false;
    }
    let Ok(solver) = Solver::<VS>::new(spec, config.clone()) else {
        return false;
    };
    solver.nth_solution(1, CancelToken::new(), None).is_none()
}

/// Iterates increasingly-reduced `FixedValues` sets. Each yielded item is a
/// strict subset of the puzzle's original givens that still has exactly one
/// solution; the iterator is exhausted once no further given can be dropped
/// without losing uniqueness.
pub struct Minimizer<VS: ValueSet> {
    base: ConstraintSpec,
    config: Config,
    remaining: FixedValues,
    required: FixedValues,
    counters: MinimizerCounters,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet + 'static> Minimizer<VS> {
    /// `base`'s own `fixed_values` seeds the pool of candidates to drop;
    /// its `nodes`/`shape`/`sudoku_x`/`no_boxes` are held fixed across every
    /// trial.
    pub fn new(base: ConstraintSpec, config: Config) -> Self {
        let remaining = base.fixed_values.clone();
        Self {
            base,
            config,
            remaining,
            required: Vec::new(),
            counters: MinimizerCounters::default(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn counters(&self) -> MinimizerCounters {
        self.counters
    }

    fn trial_spec(&self, fixed_values: FixedValues) -> ConstraintSpec {
        let mut spec = self.base.clone();
        spec.fixed_values = fixed_values;
        spec
    }
}

impl<VS: ValueSet + 'static> Iterator for Minimizer<VS> {
    type Item = FixedValues;

    fn next(&mut self) -> Option<FixedValues> {
        loop {
            let item = self.remaining.pop()?;
            let candidate: FixedValues =
                self.remaining.iter().chain(self.required.iter()).copied().collect();

            self.counters.cells_tried += 1;

            if is_unique::<VS>(self.trial_spec(candidate.clone()), &self.config) {
                self.counters.cells_removed += 1;
                return Some(candidate);
            }
            // Either zero or multiple solutions without `item`: it was load-bearing.
            self.required.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Node;
    use crate::types::{CellValue, GridShape};
    use crate::value_set::Mask16;

    fn latin_square_4x4(fixed_values: FixedValues) -> ConstraintSpec {
        ConstraintSpec {
            shape: GridShape::square(2),
            fixed_values,
            sudoku_x: false,
            no_boxes: false,
            nodes: Vec::<Node>::new(),
        }
    }

    #[test]
    fn minimizer_never_yields_a_set_with_multiple_solutions() {
        let fixed = vec![
            (0, CellValue::from_display_value(1)),
            (1, CellValue::from_display_value(2)),
            (2, CellValue::from_display_value(2)),
            (3, CellValue::from_display_value(1)),
            (4, CellValue::from_display_value(2)),
            (5, CellValue::from_display_value(1)),
            (6, CellValue::from_display_value(1)),
            (7, CellValue::from_display_value(2)),
        ];
        let spec = latin_square_4x4(fixed);
        let mut minimizer = Minimizer::<Mask16>::new(spec, Config::default());
        for reduced in &mut minimizer {
            assert!(is_unique::<Mask16>(
                {
                    let mut s = latin_square_4x4(reduced.clone());
                    s.fixed_values = reduced;
                    s
                },
                &Config::default()
            ));
        }
        assert!(minimizer.counters().cells_tried > 0);
    }
}
