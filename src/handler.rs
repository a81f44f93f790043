//! The uniform handler contract (spec.md section 4.2) and the per-solve
//! scratch-space allocator (spec.md section 9's "linear per-solve
//! StateAllocator" design note).

use crate::accumulator::{CellContainer, HandlerAccumulator};
use crate::exclusions::CellExclusions;
use crate::types::CellIndex;
use crate::types::GridShape;
use crate::value_set::ValueSet;

/// A local contradiction: the grid can no longer be made consistent along
/// this branch. Recovered by backtracking (spec.md section 7); never a
/// panic or a `Result` bubbled past the search driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contradiction;

pub type StepResult = Result<(), Contradiction>;

/// SINGLETON_HANDLER handlers (at most one per cell) are drained before any
/// ordinary handler runs for that cell, matching spec.md section 4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Singleton,
    Ordinary,
}

/// Every constraint handler — from a plain `House` to the NFA-backed
/// `Regex` handler — implements this. `VS` is fixed per solve (normally
/// `Mask16`); handlers are stored as `Box<dyn Handler<VS>>` in the
/// `HandlerSet`.
pub trait Handler<VS: ValueSet> {
    /// The cells this handler constrains. Immutable after `initialize`.
    fn cells(&self) -> &[CellIndex];

    fn kind(&self) -> HandlerKind {
        HandlerKind::Ordinary
    }

    /// Branch-priority boost, used by the candidate-selector as the primary
    /// sort key (spec.md section 4.4). Defaults to the handler's cell count,
    /// matching every teacher handler's implicit size-based cost.
    fn priority(&self) -> u32 {
        self.cells().len() as u32
    }

    /// Whether this handler encodes grid *layout* (uniqueness structure and
    /// clues) rather than a puzzle-specific extra constraint. `validateLayout`
    /// (spec.md section 4.4) runs with every non-layout handler disabled.
    fn is_layout(&self) -> bool {
        false
    }

    /// May prune the initial grid. Returns `Err` on immediate contradiction.
    fn initialize(
        &mut self,
        _grid: &mut [VS],
        _exclusions: &CellExclusions,
        _shape: &GridShape,
    ) -> StepResult {
        Ok(())
    }

    /// Runs once, after every handler's `initialize` has completed and the
    /// grid reached its first fixpoint; read-only.
    fn post_initialize(&mut self, _grid: &[VS]) {}

    /// Re-establishes local consistency. Must be idempotent: calling it
    /// twice with no intervening grid change must not enqueue further work.
    /// Must never widen a mask, and must never mutate cells outside
    /// `cells()` (SameValues-like handlers declare the extra cells in their
    /// `cells()` list instead).
    fn enforce_consistency(&mut self, grid: &mut [VS], queue: &mut HandlerAccumulator)
        -> StepResult;

    /// Cells this handler reports as mutually-excluding (contributes to
    /// `CellExclusions`). Only houses and all-different-shaped handlers
    /// report anything here.
    fn exclusion_cells(&self) -> Option<Vec<CellIndex>> {
        None
    }

    /// An optional cell-ordering hint for the candidate-selector, e.g. "try
    /// the bulb of an arrow before its shaft". Returning `None` leaves the
    /// default MRV order untouched.
    fn candidate_finder(&self, _grid: &[VS], _shape: &GridShape) -> Option<Vec<CellIndex>> {
        None
    }
}

/// Adapts any `Handler` to the accumulator's `CellContainer` so
/// `HandlerAccumulator::new` can build its cell -> handler index directly
/// over a `HandlerSet`'s handler list.
impl<VS: ValueSet> CellContainer for Box<dyn Handler<VS>> {
    fn cells(&self) -> &[CellIndex] {
        Handler::cells(self.as_ref())
    }
}

/// Per-solve scratch space. Handlers that need pre-sized working buffers
/// (a killer cage's combination masks, a house's candidate-matching table)
/// pull them from here during `initialize` instead of allocating ad hoc on
/// every `enforce_consistency` call. Kept intentionally simple — a thin
/// bump counter over ordinary `Vec` allocations — rather than an unsafe
/// arena, since the handlers that matter (see `handlers/house.rs`,
/// `handlers/sum.rs`) already avoid per-node allocation just by owning their
/// scratch `Vec`s for the handler's lifetime; this type exists so that
/// ownership and reset-at-solve-start are explicit and testable.
#[derive(Default)]
pub struct StateAllocator {
    allocations: usize,
    elements: usize,
}

impl StateAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_vec<T: Clone>(&mut self, len: usize, fill: T) -> Vec<T> {
        self.allocations += 1;
        self.elements += len;
        vec![fill; len]
    }

    pub fn reset(&mut self) {
        self.allocations = 0;
        self.elements = 0;
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn elements(&self) -> usize {
        self.elements
    }
}
