//! The optimizer (spec.md section 4.3): runs once over the houses and sums
//! the constraint resolver extracted from the puzzle description, and
//! synthesizes auxiliary handlers (tagged non-essential in the `HandlerSet`)
//! that make propagation stronger without changing which grids are
//! solutions. Not present in the teacher (a plain Sudoku has nothing to
//! optimize — its houses are already maximally informative); built directly
//! from spec.md section 4.3's numbered steps, reusing the handler types
//! `handlers/` already provides.
//!
//! Step 1 ("add a House for every AllDifferent whose exclusion cells number
//! exactly numValues") is subsumed by constraint resolution itself: any
//! all-different group of exactly `numValues` cells is already built as a
//! `House`, never as a bare `AllDifferent`, so there is nothing left for the
//! optimizer to promote by the time it runs. Steps 2 (replace-small /
//! innie-outie / hidden-cage / gap-complement) and 4 (substantial-overlap
//! `SameValues`, folding in step 7's box-specific case) are implemented
//! below. Step 3 ("complement cells") is folded into step 2's hidden-cage
//! synthesis rather than kept as a separate per-handler annotation. Step 5
//! (law-of-leftovers) falls out of step 4 for free since rows/columns/boxes
//! are already houses in `houses`, so no separate sweep is implemented.
//! Step 6 (full-rank fusion) is **not implemented**: fusing independent
//! `FullRank` handlers into one joint handler needs per-clue metadata
//! (`rank_from_start`/`rank_from_end`) the generic `Handler` trait doesn't
//! expose; each `FullRank` handler still runs correctly on its own, just
//! without the cross-handler fusion spec.md describes.

use std::sync::Arc;

use crate::handler_set::HandlerSet;
use crate::handlers::binary::BinaryConstraint;
use crate::handlers::given::GivenCandidates;
use crate::handlers::same_values::SameValues;
use crate::handlers::sum::{Sum, SumWithNegative};
use crate::lookup::LookupTables;
use crate::types::{CellIndex, GridShape};
use crate::value_set::ValueSet;

/// A resolved `Sum` constraint, as the constraint resolver hands it to the
/// optimizer (before any handler objects are built for it).
#[derive(Clone)]
pub struct SumDescriptor {
    pub cells: Vec<CellIndex>,
    pub target: i64,
}

/// Cut-down threshold mirroring spec.md section 4.3's "more than ~6 cells
/// are discarded unless skew >= 2".
const MAX_SYNTHESIZED_CAGE: usize = 6;
const SKEW_THRESHOLD: i64 = 2;

pub struct Optimizer;

impl Optimizer {
    /// Runs every step against `houses`/`sums` and appends synthesized
    /// handlers to `handler_set` via `push_auxiliary`.
    pub fn run<VS: ValueSet + 'static>(
        shape: &GridShape,
        houses: &[Vec<CellIndex>],
        sums: &[SumDescriptor],
        tables: Arc<LookupTables>,
        handler_set: &mut HandlerSet<VS>,
    ) {
        Self::replace_small_sums(sums, tables.clone(), handler_set);
        Self::innie_outie(shape, houses, sums, tables.clone(), handler_set);
        Self::hidden_cage(shape, houses, sums, tables.clone(), handler_set);
        Self::gap_complement(shape, houses, sums, tables, handler_set);
        Self::substantial_overlaps(houses, handler_set);
    }

    /// Step 2's tail: a 1-cell sum is just a given; a 2-cell sum is a
    /// pairwise relation table.
    fn replace_small_sums<VS: ValueSet + 'static>(
        sums: &[SumDescriptor],
        tables: Arc<LookupTables>,
        handler_set: &mut HandlerSet<VS>,
    ) {
        for sum in sums {
            match sum.cells.as_slice() {
                &[cell] => {
                    if sum.target < 1 || sum.target > tables.num_values as i64 {
                        continue;
                    }
                    let mask = VS::from_value((sum.target - 1) as u8);
                    handler_set.push_auxiliary(Box::new(GivenCandidates::new(
                        vec![cell],
                        vec![mask],
                    )));
                }
                &[a, b] => {
                    let table = sum_pair_table::<VS>(tables.num_values, sum.target);
                    handler_set.push_auxiliary(Box::new(BinaryConstraint::new(a, b, table)));
                }
                _ => {}
            }
        }
    }

    /// Step 2's innie/outie synthesis: for every house/sum pair that
    /// partially overlaps, emit `(cage outside house) - (house outside
    /// cage) = cage_sum - house_sum`.
    fn innie_outie<VS: ValueSet + 'static>(
        shape: &GridShape,
        houses: &[Vec<CellIndex>],
        sums: &[SumDescriptor],
        tables: Arc<LookupTables>,
        handler_set: &mut HandlerSet<VS>,
    ) {
        let house_sum = shape.max_sum() as i64;
        for house in houses {
            for sum in sums {
                let cage_outside: Vec<CellIndex> = sum
                    .cells
                    .iter()
                    .copied()
                    .filter(|c| !house.contains(c))
                    .collect();
                let house_outside: Vec<CellIndex> = house
                    .iter()
                    .copied()
                    .filter(|c| !sum.cells.contains(c))
                    .collect();
                let overlap = sum.cells.len() - cage_outside.len();
                if overlap == 0 || cage_outside.is_empty() || house_outside.is_empty() {
                    continue;
                }
                let target = sum.target - house_sum;
                let len = cage_outside.len() + house_outside.len();
                if exceeds_size_budget(len, target, tables.num_values) {
                    continue;
                }
                handler_set.push_auxiliary(Box::new(SumWithNegative::<VS>::new(
                    cage_outside,
                    house_outside,
                    target,
                    tables.clone(),
                )));
            }
        }
    }

    /// Step 2's hidden-cage synthesis: sums fully contained in a house sum
    /// to `sigma`; the house's remaining cells then sum to `maxSum - sigma`.
    fn hidden_cage<VS: ValueSet + 'static>(
        shape: &GridShape,
        houses: &[Vec<CellIndex>],
        sums: &[SumDescriptor],
        tables: Arc<LookupTables>,
        handler_set: &mut HandlerSet<VS>,
    ) {
        let house_sum = shape.max_sum() as i64;
        for house in houses {
            let contained: Vec<&SumDescriptor> = sums
                .iter()
                .filter(|s| s.cells.iter().all(|c| house.contains(c)))
                .collect();
            if contained.is_empty() {
                continue;
            }
            let mut covered: Vec<CellIndex> = contained.iter().flat_map(|s| s.cells.clone()).collect();
            covered.sort_unstable();
            covered.dedup();
            if covered.len() == house.len() {
                continue; // nothing left over to synthesize
            }
            let sigma: i64 = contained.iter().map(|s| s.target).sum();
            let remainder: Vec<CellIndex> = house
                .iter()
                .copied()
                .filter(|c| !covered.contains(c))
                .collect();
            let target = house_sum - sigma;
            if remainder.is_empty() || exceeds_size_budget(remainder.len(), target, tables.num_values) {
                continue;
            }
            handler_set.push_auxiliary(Box::new(Sum::<VS>::new(
                remainder,
                target,
                tables.clone(),
            )));
        }
    }

    /// Step 2's gap-complement: a greedy non-overlapping pick of sums by
    /// ascending cell count (least overlap risk first); if the picked sums'
    /// union misses fewer than `numValues` cells, synthesize a complement
    /// covering the gap.
    fn gap_complement<VS: ValueSet + 'static>(
        shape: &GridShape,
        houses: &[Vec<CellIndex>],
        sums: &[SumDescriptor],
        tables: Arc<LookupTables>,
        handler_set: &mut HandlerSet<VS>,
    ) {
        let _ = houses;
        let mut ordered: Vec<&SumDescriptor> = sums.iter().collect();
        ordered.sort_by_key(|s| s.cells.len());

        let mut picked_cells: Vec<CellIndex> = Vec::new();
        let mut picked_sum = 0i64;
        for sum in ordered {
            if sum.cells.iter().any(|c| picked_cells.contains(c)) {
                continue;
            }
            picked_cells.extend(sum.cells.iter());
            picked_sum += sum.target;
        }

        let gap: Vec<CellIndex> = (0..shape.num_cells)
            .filter(|c| !picked_cells.contains(c))
            .collect();
        if gap.is_empty() || gap.len() >= shape.num_values as usize {
            return;
        }
        // Every row sums to maxSum, so the whole grid sums to numRows * maxSum.
        let total = shape.num_rows as i64 * shape.max_sum() as i64;
        handler_set.push_auxiliary(Box::new(Sum::<VS>::new(gap, total - picked_sum, tables)));
    }

    /// Steps 4 and 7: houses whose overlap is "substantial" (at least 2
    /// shared cells, covering both the jigsaw case and the
    /// box-row/box-column case) emit `SameValues` on the set differences.
    fn substantial_overlaps<VS: ValueSet + 'static>(
        houses: &[Vec<CellIndex>],
        handler_set: &mut HandlerSet<VS>,
    ) {
        const SUBSTANTIAL: usize = 2;
        for i in 0..houses.len() {
            for j in (i + 1)..houses.len() {
                let h0 = &houses[i];
                let h1 = &houses[j];
                let overlap = h0.iter().filter(|c| h1.contains(c)).count();
                if overlap < SUBSTANTIAL {
                    continue;
                }
                let only0: Vec<CellIndex> = h0.iter().copied().filter(|c| !h1.contains(c)).collect();
                let only1: Vec<CellIndex> = h1.iter().copied().filter(|c| !h0.contains(c)).collect();
                if only0.is_empty() || only1.is_empty() || only0.len() != only1.len() {
                    continue;
                }
                handler_set.push_auxiliary(Box::new(SameValues::new(only0, only1)));
            }
        }
    }
}

/// spec.md section 4.3's size heuristic: a synthesized cage bigger than
/// `MAX_SYNTHESIZED_CAGE` is still worth keeping if its average value skews
/// far enough from the grid's midpoint value to narrow candidates sharply.
fn exceeds_size_budget(len: usize, target: i64, num_values: u8) -> bool {
    if len <= MAX_SYNTHESIZED_CAGE {
        return false;
    }
    let average = target as f64 / len as f64;
    let midpoint = num_values as f64 / 2.0;
    (average - midpoint).abs() < SKEW_THRESHOLD as f64
}

fn sum_pair_table<VS: ValueSet>(num_values: u8, target: i64) -> Vec<VS> {
    (0..num_values)
        .map(|v| {
            let other = target - (v as i64 + 1);
            if other < 1 || other > num_values as i64 {
                VS::empty()
            } else {
                VS::from_value((other - 1) as u8)
            }
        })
        .collect()
}
