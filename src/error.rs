//! Fatal (engine-bug) errors (spec.md section 7). Recoverable outcomes — no
//! solution, aborted, contradiction — are never part of this type; they are
//! ordinary `SolveOutcome` values returned by the search driver. `EngineError`
//! is only ever produced while building a `Solver` from a resolved
//! constraint tree, the way `freddiehaddad-oxidized` scopes its `thiserror`
//! enums to "this operation cannot proceed", not to recoverable editor state.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("handler references unknown kind: {0}")]
    UnknownHandlerKind(String),

    #[error("malformed cell list: {0}")]
    MalformedCellList(String),

    #[error("value {value} out of range for a grid of {num_values} values")]
    ValueOutOfRange { value: u32, num_values: u8 },

    #[error("grid of {0} values exceeds the 16-value bit ceiling")]
    ValuesExceedBitCeiling(u32),
}
