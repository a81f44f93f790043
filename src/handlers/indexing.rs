//! `Indexing` (spec.md section 4.2): the *v*-th cell of a row/column equals
//! the column/row index of a value (numbered-rooms and indexer variants).
//! Enforces a mutual implication between the indexed cell's value and the
//! positional value: if cell at offset `v-1` cannot hold value `w`, then the
//! cell at offset `w-1` cannot hold `v`. This is sound but not maximally
//! tight — it prunes every impossible reciprocal pair but does not force a
//! cell down to a singleton purely from the other side becoming unique;
//! that last step falls out naturally once the `House` handlers sharing
//! these cells run their own hidden/naked-single passes.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub struct Indexing<VS: ValueSet> {
    /// `line[i]` is the cell at offset `i` (0-based) along the indexed row
    /// or column.
    line: Vec<CellIndex>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Indexing<VS> {
    pub fn new(line: Vec<CellIndex>) -> Self {
        Self {
            line,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Indexing<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.line
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let n = self.line.len();
        let mut touched = Vec::new();

        // If cell at offset (v-1) can't hold w, then cell at offset (w-1)
        // can't hold v. Iterate until no more eliminations are found in a
        // single pass (re-queuing handles further rounds).
        for v in 1..=n as u8 {
            let index_cell = self.line[(v - 1) as usize];
            let possible_w = grid[index_cell];

            // For every w NOT in possible_w, forbid cell (w-1) from holding v.
            let mut forbidden_w = VS::full(n as u8);
            forbidden_w.remove_set(possible_w);
            let mut fw = forbidden_w;
            while let Some(w) = fw.pop() {
                let target_cell = self.line[w as usize];
                let mut mask = grid[target_cell];
                mask.remove_set(VS::from_value(v - 1));
                if mask.is_empty() {
                    return Err(Contradiction);
                }
                if !mask.equals(&grid[target_cell]) {
                    grid[target_cell] = mask;
                    touched.push(target_cell);
                }
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
    fn fixed_index_cell_prunes_impossible_reciprocals() {
        // line of 4 cells; cell[0] (v=1) fixed to w=3 (bit index 2) means
        // every other position (w=1,2,4) can no longer hold v=1 (bit index 0).
        let mut grid = vec![
            Mask16::from_value(2), // cell0 -> w=3
            Mask16::full(4),
            Mask16::full(4),
            Mask16::full(4),
        ];
        let mut h: Indexing<Mask16> = Indexing::new(vec![0, 1, 2, 3]);
        let handlers: Vec<Box<dyn Handler<Mask16>>> = vec![];
        let mut queue = HandlerAccumulator::new(4, &handlers);
        assert!(h.enforce_consistency(&mut grid, &mut queue).is_ok());
        assert!(grid[1].intersection(&Mask16::from_value(0)).is_empty());
        assert!(grid[3].intersection(&Mask16::from_value(0)).is_empty());
    }
}
