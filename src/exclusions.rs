//! Per-cell "must differ" sets (spec.md section 3, "CellExclusions").
//! Grounded on the teacher's first-generation `make_cell_conflicts`
//! (`src/solver.rs`), generalized from "every pair within a hardcoded house"
//! to "every pair reported by any handler's `exclusion_cells()`".

use std::collections::{HashMap, HashSet};

use crate::types::CellIndex;

pub struct CellExclusions {
    conflicts: Vec<Vec<CellIndex>>,
    pair_exclusions: HashMap<(CellIndex, CellIndex), Vec<CellIndex>>,
}

impl CellExclusions {
    /// Builds the exclusion closure from every handler's reported
    /// all-different cell groups (houses, `AllDifferent`, `SameValues`-style
    /// constraints that advertise exclusions).
    pub fn build(num_cells: usize, groups: &[Vec<CellIndex>]) -> CellExclusions {
        let mut conflict_sets: Vec<HashSet<CellIndex>> = vec![HashSet::new(); num_cells];
        for group in groups {
            for &c1 in group {
                for &c2 in group {
                    if c1 != c2 {
                        conflict_sets[c1].insert(c2);
                    }
                }
            }
        }

        let mut conflicts: Vec<Vec<CellIndex>> = conflict_sets
            .into_iter()
            .map(|set| {
                let mut v: Vec<_> = set.into_iter().collect();
                v.sort_unstable();
                v
            })
            .collect();
        for v in &mut conflicts {
            v.shrink_to_fit();
        }

        CellExclusions {
            conflicts,
            pair_exclusions: HashMap::new(),
        }
    }

    #[inline]
    pub fn excludes(&self, cell: CellIndex) -> &[CellIndex] {
        &self.conflicts[cell]
    }

    #[inline]
    pub fn mutually_excludes(&self, a: CellIndex, b: CellIndex) -> bool {
        self.conflicts[a].binary_search(&b).is_ok()
    }

    /// Cells that see both `a` and `b` (computed once and cached): useful for
    /// handlers like the 2-cell `Sum` -> `BinaryConstraint` specialization
    /// that additionally forbids `a == b` only when `a` and `b` already see
    /// each other.
    pub fn cells_seeing_pair(&mut self, a: CellIndex, b: CellIndex) -> &[CellIndex] {
        let key = if a < b { (a, b) } else { (b, a) };
        self.pair_exclusions.entry(key).or_insert_with(|| {
            let (a, b) = key;
            self.conflicts[a]
                .iter()
                .filter(|c| self.conflicts[b].binary_search(c).is_ok())
                .copied()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_symmetric_conflicts_from_groups() {
        let groups = vec![vec![0, 1, 2], vec![2, 3]];
        let ex = CellExclusions::build(4, &groups);
        assert_eq!(ex.excludes(0), &[1, 2]);
        assert_eq!(ex.excludes(2), &[0, 1, 3]);
        assert!(ex.mutually_excludes(0, 1));
        assert!(!ex.mutually_excludes(0, 3));
    }

    #[test]
    fn cells_seeing_pair_is_the_intersection() {
        let groups = vec![vec![0, 1, 2], vec![0, 2, 3]];
        let mut ex = CellExclusions::build(4, &groups);
        let seeing = ex.cells_seeing_pair(1, 3);
        assert_eq!(seeing, &[0, 2]);
    }
}
