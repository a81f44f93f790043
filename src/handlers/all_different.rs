//! `AllDifferent` (spec.md section 4.2) — full arc-consistency for "these
//! cells hold pairwise-distinct values", via Régin's bipartite-matching +
//! strongly-connected-components algorithm
//! (<http://www.constraint-programming.com/people/regin/papers/alldiff.pdf>).
//!
//! Ported near-verbatim from the teacher's `solver/all_different.rs`
//! (generalized from the teacher's concrete `i64`-backed `ValueSet` to the
//! `ValueSet` trait). `House` (spec.md's table) calls `enforce_all_different`
//! directly for its own pairwise exclusivity instead of a separate
//! "eliminate peers" shortcut, matching spec.md section 4.1.

use std::cmp;

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

/// Runs Régin's algorithm over `cells`, narrowing `grid` in place. Returns
/// `false` on a contradiction (no perfect matching exists).
pub fn enforce_all_different<VS: ValueSet>(grid: &mut [VS], cells: &[CellIndex]) -> bool {
    let mut cell_nodes = cells.iter().map(|c| grid[*c]).collect::<Vec<_>>();
    let mut assignees = vec![0usize; cells.len()];

    if !max_matching(&cell_nodes, &mut assignees) {
        return false;
    }

    remove_scc(&mut cell_nodes, &assignees);

    for (i, &cell) in cells.iter().enumerate() {
        grid[cell] = grid[cell].intersection(&cell_nodes[i].invert());
    }

    true
}

fn remove_scc<VS: ValueSet>(cell_nodes: &mut [VS], assignees: &[usize]) {
    let mut rec_stack = Vec::new();
    let mut scc_stack = Vec::new();
    let mut ids = vec![0usize; cell_nodes.len()];
    let mut lowlinks = vec![0usize; cell_nodes.len()];
    let mut assignees_inv = vec![VS::empty(); cell_nodes.len()];

    let mut seen = VS::empty();
    let mut inv_seen = VS::empty();
    let mut inv_stack_member = VS::empty();
    let mut index = 0usize;
    let mut prev_rec_stack_top = 0usize;

    for (i, &assignee) in assignees.iter().enumerate() {
        let i_set = VS::from_value(i as u8);
        cell_nodes[assignee] = cell_nodes[assignee].intersection(&i_set.invert());
        assignees_inv[assignee] = i_set;
    }

    for i in 0..cell_nodes.len() {
        let cell_node = cell_nodes[i];
        // Try the next unseen node. If it has no edges, skip it (fixed value).
        if cell_node.is_empty() || !seen.intersection(&VS::from_value(i as u8)).is_empty() {
            continue;
        }

        rec_stack.push(i);

        while let Some(&u) = rec_stack.last() {
            let u_set = VS::from_value(u as u8);
            if seen.intersection(&u_set).is_empty() {
                // First time we've seen u.
                ids[u] = index;
                lowlinks[u] = index;
                index += 1;
                seen = seen.union(&u_set);
                let u_inv = assignees_inv[u];
                inv_stack_member = inv_stack_member.union(&u_inv);
                inv_seen = inv_seen.union(&u_inv);
                scc_stack.push(u);
            } else {
                // We returned from a recursive call.
                let n = prev_rec_stack_top;
                lowlinks[u] = cmp::min(lowlinks[u], lowlinks[n]);
            }

            // Recurse into the next unseen node.
            let unseen_adj = cell_nodes[u].intersection(&inv_seen.invert());
            if !unseen_adj.is_empty() {
                let n = assignees[unseen_adj.lowest_index() as usize];
                rec_stack.push(n);
                continue;
            }

            // Handle any adjacent nodes already in the stack.
            let mut stack_adj = cell_nodes[u].intersection(&inv_stack_member);
            while !stack_adj.is_empty() {
                let node = stack_adj.min();
                stack_adj.remove_set(node);
                let n = assignees[node.lowest_index() as usize];
                lowlinks[u] = cmp::min(lowlinks[u], ids[n]);
            }

            // We have looked at all the relevant edges. If u is a root node,
            // pop the scc_stack and generate an SCC.
            if lowlinks[u] == ids[u] {
                let mut mask = VS::empty().invert();
                for scc_index in (0..scc_stack.len()).rev() {
                    let w = scc_stack[scc_index];
                    let inv_mask = assignees_inv[w].invert();
                    inv_stack_member = inv_stack_member.intersection(&inv_mask);
                    mask = mask.intersection(&inv_mask);
                    if w == u {
                        break;
                    }
                }

                let mut w = u;
                loop {
                    cell_nodes[w] = cell_nodes[w].intersection(&mask);
                    w = scc_stack.pop().unwrap();
                    if w == u {
                        break;
                    }
                }
            }

            prev_rec_stack_top = *rec_stack.last().unwrap();
            rec_stack.pop();
        }
    }
}

fn max_matching<VS: ValueSet>(cell_nodes: &[VS], assignees: &mut [usize]) -> bool {
    let mut assigned = VS::empty();

    for (i, cell_node) in cell_nodes.iter().enumerate() {
        let values = cell_node.intersection(&assigned.invert());
        if !values.is_empty() {
            let value = values.min();
            let v = value.lowest_index();
            assignees[v as usize] = i;
            assigned = assigned.union(&value);
        } else {
            let matched = update_matching(cell_nodes, i, assignees, assigned);
            if matched.is_empty() {
                return false;
            }
            assigned = assigned.union(&matched);
        }
    }

    true
}

fn update_matching<VS: ValueSet>(
    cell_nodes: &[VS],
    cell: CellIndex,
    assignees: &mut [usize],
    assigned: VS,
) -> VS {
    let mut c_stack = vec![cell; 1];
    let mut v_stack = vec![0u8; cell_nodes.len()];

    let mut seen = VS::empty();

    while let Some(&c) = c_stack.last() {
        let values = cell_nodes[c].intersection(&seen.invert());

        if values.is_empty() {
            c_stack.pop();
            continue;
        }

        let value = values.min();
        let v = value.lowest_index();
        v_stack[c_stack.len() - 1] = v;

        let next_c = assignees[v as usize];
        let next_values = cell_nodes[next_c].intersection(&assigned.invert());
        if !next_values.is_empty() {
            let next_v = next_values.lowest_index();
            assignees[next_v as usize] = next_c;
            while let Some(c) = c_stack.pop() {
                assignees[v_stack[c_stack.len()] as usize] = c;
            }
            return next_values.min();
        }

        seen = seen.union(&value);
        c_stack.push(next_c);
    }

    VS::empty()
}

/// The standalone `AllDifferent` handler (spec.md's table): a group of at
/// most `num_values` cells constrained to pairwise-distinct values, without
/// the house invariant that every value must appear. Degenerates to a
/// `House` only when the group has exactly `num_values` cells — the
/// optimizer's step 1 promotes that case (see `optimizer.rs`).
pub struct AllDifferent {
    cells: Vec<CellIndex>,
}

impl AllDifferent {
    pub fn new(cells: Vec<CellIndex>) -> Self {
        Self { cells }
    }
}

impl<VS: ValueSet> Handler<VS> for AllDifferent {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let before: Vec<VS> = self.cells.iter().map(|&c| grid[c]).collect();
        if !enforce_all_different(grid, &self.cells) {
            return Err(Contradiction);
        }
        for (i, &cell) in self.cells.iter().enumerate() {
            if !grid[cell].equals(&before[i]) {
                queue.add_for_cell(cell);
            }
        }
        Ok(())
    }

    fn exclusion_cells(&self) -> Option<Vec<CellIndex>> {
        Some(self.cells.clone())
    }

    fn is_layout(&self) -> bool {
        true
    }
}
