//! `Thermo` (spec.md section 4.2): a strictly increasing sequence of cells
//! along a path (bulb to tip). Propagation is a pure min/max sweep: the
//! i-th cell along the path can hold at most `maxValue - (len - 1 - i)` and
//! at least `minValue + i`, so a low-value push forward and a high-value
//! push backward converge to a fixpoint in two scans.

use crate::accumulator::HandlerAccumulator;
use crate::handler::{Contradiction, Handler, StepResult};
use crate::lookup::LookupTables;
use crate::types::CellIndex;
use crate::value_set::ValueSet;
use std::sync::Arc;

pub struct Thermo<VS: ValueSet> {
    cells: Vec<CellIndex>,
    tables: Arc<LookupTables>,
    _marker: std::marker::PhantomData<VS>,
}

impl<VS: ValueSet> Thermo<VS> {
    pub fn new(cells: Vec<CellIndex>, tables: Arc<LookupTables>) -> Self {
        Self {
            cells,
            tables,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<VS: ValueSet> Handler<VS> for Thermo<VS> {
    fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut [VS],
        queue: &mut HandlerAccumulator,
    ) -> StepResult {
        let n = self.cells.len();
        let mut touched = Vec::new();

        // Forward pass: cell i's minimum allowed value rises with i.
        let mut floor = 0u8;
        for (i, &cell) in self.cells.iter().enumerate() {
            let (lo, _) = self.tables.min_max[grid[cell].to_bits() as usize];
            if lo == 0 {
                return Err(Contradiction);
            }
            let required_floor = floor.max(if i == 0 { 1 } else { floor + 1 });
            if lo < required_floor {
                let mask = values_at_least(required_floor, self.tables.num_values);
                let narrowed = grid[cell].intersection(&VS::from_bits(mask));
                if narrowed.is_empty() {
                    return Err(Contradiction);
                }
                if !narrowed.equals(&grid[cell]) {
                    grid[cell] = narrowed;
                    touched.push(cell);
                }
            }
            let (lo_after, _) = self.tables.min_max[grid[cell].to_bits() as usize];
            floor = lo_after;
        }

        // Backward pass: cell i's maximum allowed value falls with distance
        // from the tip.
        let mut ceiling = self.tables.num_values;
        for i in (0..n).rev() {
            let cell = self.cells[i];
            let (_, hi) = self.tables.min_max[grid[cell].to_bits() as usize];
            if hi == 0 {
                return Err(Contradiction);
            }
            let required_ceiling = if i == n - 1 {
                ceiling
            } else {
                ceiling.saturating_sub(1)
            };
            if hi > required_ceiling {
                let mask = values_at_most(required_ceiling, self.tables.num_values);
                let narrowed = grid[cell].intersection(&VS::from_bits(mask));
                if narrowed.is_empty() {
                    return Err(Contradiction);
                }
                if !narrowed.equals(&grid[cell]) {
                    grid[cell] = narrowed;
                    touched.push(cell);
                }
            }
            let (_, hi_after) = self.tables.min_max[grid[cell].to_bits() as usize];
            ceiling = hi_after;
        }

        queue.add_for_cells(&touched);
        Ok(())
    }
}

fn values_at_least(floor: u8, num_values: u8) -> u16 {
    if floor == 0 {
        return (1u16 << num_values) - 1;
    }
    let all = (1u16 << num_values) - 1;
    let below = (1u16 << (floor - 1)) - 1;
    all & !below
}

fn values_at_most(ceiling: u8, num_values: u8) -> u16 {
    if ceiling >= num_values {
        return (1u16 << num_values) - 1;
    }
    (1u16 << ceiling) - 1
}
