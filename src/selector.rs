//! The branch-cell candidate selector (spec.md section 4.4 step 2): "(a)
//! highest `Priority.priority()`; tie-break by (b) minimum remaining
//! values; then (c) caller-supplied candidate finders may re-order cells."
//! Grounded on the teacher's `Solver::update_cell_order` bring-to-front
//! swap, extended with the priority boost as the primary key (the teacher
//! has no `Priority` handler; spec.md's is new) and an optional hint cell
//! from a handler's `candidate_finder`.

use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct Selector;

impl Selector {
    /// Brings the best branch cell among `cell_order[from..]` to the front
    /// of that range and returns it. `priorities`/`backtrack_triggers` are
    /// indexed by cell id; `hint`, if present and tied with the best score,
    /// wins instead.
    pub fn pick<VS: ValueSet>(
        grid: &[VS],
        cell_order: &mut [CellIndex],
        from: usize,
        priorities: &[u32],
        backtrack_triggers: &[u32],
        hint: Option<CellIndex>,
    ) -> CellIndex {
        assert!(from < cell_order.len());

        let mut best_index = from;
        let mut best_priority = priorities[cell_order[from]];
        let mut best_score = Self::score(grid, cell_order[from], backtrack_triggers);

        for i in (from + 1)..cell_order.len() {
            let cell = cell_order[i];
            let priority = priorities[cell];
            let score = Self::score(grid, cell, backtrack_triggers);
            let better = priority > best_priority || (priority == best_priority && score < best_score);
            if better {
                best_index = i;
                best_priority = priority;
                best_score = score;
            }
        }

        if let Some(hint_cell) = hint {
            if let Some(hint_index) = cell_order[from..].iter().position(|&c| c == hint_cell) {
                let hint_index = hint_index + from;
                let hint_priority = priorities[hint_cell];
                let hint_score = Self::score(grid, hint_cell, backtrack_triggers);
                if hint_priority == best_priority && hint_score == best_score {
                    best_index = hint_index;
                }
            }
        }

        cell_order.swap(from, best_index);
        cell_order[from]
    }

    /// Minimum-remaining-values, weighted down by how often this cell has
    /// triggered a backtrack recently (teacher's `update_cell_order` score).
    fn score<VS: ValueSet>(grid: &[VS], cell: CellIndex, backtrack_triggers: &[u32]) -> u32 {
        let count = grid[cell].count() as u32;
        let bt = backtrack_triggers[cell];
        if bt > 1 {
            count / bt
        } else {
            count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn priority_wins_over_fewer_remaining_values() {
        let grid = vec![Mask16::full(4), Mask16::from_value(0).union(&Mask16::from_value(1))];
        let mut order = vec![0, 1];
        let priorities = vec![5, 0];
        let backtrack_triggers = vec![0, 0];
        let picked = Selector::pick(&grid, &mut order, 0, &priorities, &backtrack_triggers, None);
        assert_eq!(picked, 0);
    }

    #[test]
    fn mrv_breaks_a_priority_tie() {
        let grid = vec![Mask16::full(4), Mask16::from_value(0).union(&Mask16::from_value(1))];
        let mut order = vec![0, 1];
        let priorities = vec![0, 0];
        let backtrack_triggers = vec![0, 0];
        let picked = Selector::pick(&grid, &mut order, 0, &priorities, &backtrack_triggers, None);
        assert_eq!(picked, 1);
    }

    #[test]
    fn hint_wins_a_full_tie() {
        let grid = vec![Mask16::full(4), Mask16::full(4)];
        let mut order = vec![0, 1];
        let priorities = vec![0, 0];
        let backtrack_triggers = vec![0, 0];
        let picked = Selector::pick(
            &grid,
            &mut order,
            0,
            &priorities,
            &backtrack_triggers,
            Some(1),
        );
        assert_eq!(picked, 1);
    }
}
