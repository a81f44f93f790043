//! A variant-Sudoku constraint-satisfaction engine (spec.md): a bitmask
//! candidate grid, a pluggable handler catalogue covering classic Sudoku
//! structure plus the closed set of variant-rule kinds (sums, thermometers,
//! arrows, killer cages, line constraints, an NFA mini-engine, and more), an
//! optimizer that synthesizes auxiliary handlers, and a depth-first search
//! driver exposing `nthSolution`/`countSolutions`/`solveAllPossibilities`/
//! `validateLayout`. Grounded throughout on `sigh-Large-Sudoku-Solver`'s
//! later, generic-over-`ValueSet` engine generation; see `DESIGN.md` for the
//! full grounding ledger.

pub mod accumulator;
pub mod codec;
pub mod constraint;
pub mod error;
pub mod exclusions;
pub mod grid;
pub mod handler;
pub mod handler_set;
pub mod handlers;
pub mod logger;
pub mod lookup;
pub mod minimizer;
pub mod nfa;
pub mod optimizer;
pub mod search;
pub mod selector;
pub mod solver;
pub mod types;
pub mod value_set;

pub use constraint::{ConstraintSpec, Node as ConstraintNode};
pub use error::EngineError;
pub use logger::{current_level as current_log_level, set_level as set_log_level, DebugLogger, LogLevel};
pub use minimizer::Minimizer;
pub use search::{CancelToken, Counters};
pub use solver::{Config, Solver, SnapshotCallback, SnapshotExtra, StateSnapshot};
pub use types::{CellIndex, CellValue, Constraint, FixedValues, GridShape, Solution, ValueType};
pub use value_set::{Mask16, ValueSet};
