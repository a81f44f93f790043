//! The candidate grid (spec.md section 4.1): a flat array of per-cell
//! masks, plus the handful of free functions every handler and the search
//! engine share. Grounded on the shape of `Grid<VS> = Vec<VS>` threaded
//! through the teacher's `engine.rs`.

use crate::types::CellIndex;
use crate::value_set::ValueSet;

pub type Grid<VS> = Vec<VS>;

pub fn full_grid<VS: ValueSet>(num_cells: usize, num_values: crate::types::ValueType) -> Grid<VS> {
    vec![VS::full(num_values); num_cells]
}

#[inline]
pub fn is_fixed<VS: ValueSet>(grid: &[VS], cell: CellIndex) -> bool {
    !grid[cell].has_multiple() && !grid[cell].is_empty()
}

#[inline]
pub fn is_contradiction<VS: ValueSet>(grid: &[VS], cell: CellIndex) -> bool {
    grid[cell].is_empty()
}

/// Narrows `grid[cell]` to its intersection with `allowed`. Returns `false`
/// (a contradiction) if the result is empty. Never widens, per the
/// propagation invariant of spec.md section 4.1.
pub fn narrow<VS: ValueSet>(grid: &mut [VS], cell: CellIndex, allowed: &VS) -> bool {
    let narrowed = grid[cell].intersection(allowed);
    grid[cell] = narrowed;
    !grid[cell].is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_set::Mask16;

    #[test]
    fn narrow_never_widens() {
        let mut grid: Grid<Mask16> = vec![Mask16::full(4)];
        assert!(narrow(&mut grid, 0, &Mask16::from_value(1)));
        assert_eq!(grid[0], Mask16::from_value(1));
        // Narrowing again with a disjoint set yields a contradiction.
        assert!(!narrow(&mut grid, 0, &Mask16::from_value(2)));
        assert!(is_contradiction(&grid, 0));
    }
}
