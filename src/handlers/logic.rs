//! `Or` / `And` (spec.md section 4.2, detailed in section 4.4 and the
//! "Or/And handlers and sandboxed grids" design note, section 9): disjunction
//! and conjunction of subordinate handler branches.
//!
//! `Or` runs each branch over a *cloned* copy of the grid (never the live
//! grid or the live accumulator) and unions back only the candidate values
//! that survive in at least one branch. `And` runs every branch directly
//! against the real grid — failure of any branch is a contradiction for the
//! whole handler, since all branches must hold simultaneously.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

/// Runs every handler in `branch` to a local fixpoint against `grid`,
/// confined to the cells the branch's own handlers declare. Used both by
/// `Or` (on a scratch grid) and `And` (on the live grid).
fn propagate_branch<VS: ValueSet>(
    grid: &mut [VS],
    branch: &mut [Box<dyn Handler<VS>>],
) -> Result<(), Contradiction> {
    let mut local_queue = HandlerAccumulator::new(grid.len(), branch);
    for i in 0..branch.len() {
        local_queue.add(i);
    }
    while let Some(i) = local_queue.pop() {
        local_queue.hold(i);
        branch[i].enforce_consistency(grid, &mut local_queue).map_err(|e| {
            local_queue.clear();
            e
        })?;
        local_queue.clear_hold();
    }
    Ok(())
}

pub struct Or<VS: ValueSet> {
    branches: Vec<Vec<Box<dyn Handler<VS>>>>,
    cells: Vec<CellIndex>,
}

impl<VS: ValueSet> Or<VS> {
    pub fn new(branches: Vec<Vec<Box<dyn Handler<VS>>>>) -> Self {
        let mut cells: Vec<CellIndex> = branches
            .iter()
            .flat_map(|b| b.iter().flat_map(|h| h.cells().to_vec()))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        Self { branches, cells }
    }
}

impl<VS: ValueSet> Handler<VS> for Or<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let mut surviving = vec![VS::empty(); self.cells.len()];
        let mut any_branch_survived = false;

        for branch in &mut self.branches {
            let mut scratch: Vec<VS> = grid.to_vec();
            if propagate_branch(&mut scratch, branch).is_ok() {
                any_branch_survived = true;
                for (i, &cell) in self.cells.iter().enumerate() {
                    surviving[i].add_set(&scratch[cell]);
                }
            }
        }

        if !any_branch_survived {
            return Err(Contradiction);
        }

        let mut touched = Vec::new();
        for (i, &cell) in self.cells.iter().enumerate() {
            let narrowed = grid[cell].intersection(&surviving[i]);
            if narrowed.is_empty() {
                return Err(Contradiction);
            }
            if !narrowed.equals(&grid[cell]) {
                grid[cell] = narrowed;
                touched.push(cell);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

pub struct And<VS: ValueSet> {
    branches: Vec<Vec<Box<dyn Handler<VS>>>>,
    cells: Vec<CellIndex>,
}

impl<VS: ValueSet> And<VS> {
    pub fn new(branches: Vec<Vec<Box<dyn Handler<VS>>>>) -> Self {
        let mut cells: Vec<CellIndex> = branches
            .iter()
            .flat_map(|b| b.iter().flat_map(|h| h.cells().to_vec()))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        Self { branches, cells }
    }
}

impl<VS: ValueSet> Handler<VS> for And<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let before: Vec<VS> = self.cells.iter().map(|&c| grid[c]).collect();
        for branch in &mut self.branches {
            propagate_branch(grid, branch)?;
        }
        let mut touched = Vec::new();
        for (i, &cell) in self.cells.iter().enumerate() {
            if !grid[cell].equals(&before[i]) {
                touched.push(cell);
            }
        }
        queue.add_for_cells(&touched);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::given::GivenCandidates;
    use crate::value_set::Mask16;

    #[test]
    fn or_with_a_single_branch_behaves_like_that_branch() {
        let mut grid = vec![Mask16::full(4)];
        let branch: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(1)]))];
        let mut h: Or<Mask16> = Or::new(vec![branch]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::from_value(1));
    }

    #[test]
    fn or_unions_surviving_branches() {
        let mut grid = vec![Mask16::full(4)];
        let branch_a: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(0)]))];
        let branch_b: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(1)]))];
        let mut h: Or<Mask16> = Or::new(vec![branch_a, branch_b]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::from_value(0).union(&Mask16::from_value(1)));
    }

    #[test]
    fn or_with_no_surviving_branch_is_a_contradiction() {
        let mut grid = vec![Mask16::from_value(2)];
        let branch_a: Vec<Box<dyn Handler<Mask16>>> =
            vec![Box::new(GivenCandidates::new(vec![0], vec![Mask16::from_value(0)]))];
        let mut h: Or<Mask16> = Or::new(vec![branch_a]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_err());
    }

    #[test]
    fn and_with_no_branches_behaves_as_true() {
        let mut grid = vec![Mask16::full(4)];
        let mut h: And<Mask16> = And::new(vec![]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(1, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[0], Mask16::full(4));
    }
}
