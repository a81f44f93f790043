//! `NFAConstraint` (spec.md section 4.2/4.6): a sequence of cells whose
//! values, read in order, must trace an accepting path through an NFA.
//! `enforce_consistency` re-runs `Nfa::allowed_symbols` (forward reachability
//! then backward reachability, spec.md section 4.6) against the current
//! per-cell masks and intersects the result back in.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::nfa::Nfa;
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct NFAConstraint<VS: ValueSet> {
    cells: Vec<CellIndex>,
    nfa: Nfa<VS>,
}

impl<VS: ValueSet> NFAConstraint<VS> {
    pub fn new(cells: Vec<CellIndex>, nfa: Nfa<VS>) -> Self {
        Self { cells, nfa }
    }
}

impl<VS: ValueSet> Handler<VS> for NFAConstraint<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let candidates: Vec<VS> = self.cells.iter().map(|&c| grid[c]).collect();
        let allowed = self.nfa.allowed_symbols(&candidates).ok_or(Contradiction)?;

        let mut touched = Vec::new();
        for (i, &cell) in self.cells.iter().enumerate() {
            if !allowed[i].equals(&grid[cell]) {
                grid[cell] = allowed[i];
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
    use crate::value_set::Mask16;

    #[test]
    fn alternating_pattern_forces_the_second_cell() {
        // "12" as a literal two-symbol pattern: the only accepting sequence
        // is display value 1 then display value 2.
        let nfa: Nfa<Mask16> = Nfa::parse("12", 9).unwrap();
        let mut grid = vec![Mask16::from_value(0), Mask16::full(9)];
        let mut h = NFAConstraint::new(vec![0, 1], nfa);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(2, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert_eq!(grid[1], Mask16::from_value(1));
    }

    #[test]
    fn impossible_sequence_is_a_contradiction() {
        let nfa: Nfa<Mask16> = Nfa::parse("12", 9).unwrap();
        let mut grid = vec![Mask16::from_value(1), Mask16::full(9)];
        let mut h = NFAConstraint::new(vec![0, 1], nfa);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(2, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_err());
    }
}
