//! Structural handlers (spec.md section 4.2): `NoBoxes`, `True`, `False`.
//! `True` is the identity (always consistent, never narrows); `False` always
//! fails; `NoBoxes` is a marker the constraint resolver reads to skip
//! emitting box houses for a Windoku/jigsaw-only grid — it carries no cells
//! and never runs as a handler itself, so it isn't represented here at all
//! (see `constraint.rs`).

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct True;

impl<VS: ValueSet> Handler<VS> for True {
    fn cells(&self) -> &[CellIndex] {
        &[]
    }

    fn priority(&self) -> u32 {
        0
    }

    fn enforce_consistency(
        &mut self,
        _grid: &mut [VS],
        _queue: &mut HandlerAccumulator,
    ) -> StepResult {
        Ok(())
    }
}

pub struct False;

impl<VS: ValueSet> Handler<VS> for False {
    fn cells(&self) -> &[CellIndex] {
        &[]
    }

    fn priority(&self) -> u32 {
        0
    }

    fn enforce_consistency(
        &mut self,
        _grid: &mut [VS],
        _queue: &mut HandlerAccumulator,
    ) -> StepResult {
        Err(Contradiction)
    }
}
