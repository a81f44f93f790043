//! Grid geometry and the few scalar types shared by every other module.

use crate::value_set::ValueSet;

pub type CellIndex = usize;
pub type ValueType = u8;

/// A 1-based cell value, as it appears in a solution or a given.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellValue(ValueType);

impl CellValue {
    /// Builds from a display value in `1..=num_values`.
    pub fn from_display_value(v: ValueType) -> Self {
        CellValue(v)
    }

    /// Builds from a 0-based bit index.
    pub fn from_index(index: ValueType) -> Self {
        CellValue(index + 1)
    }

    pub fn index(&self) -> ValueType {
        self.0 - 1
    }

    pub fn display_value(&self) -> ValueType {
        self.0
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type FixedValues = Vec<(CellIndex, CellValue)>;
pub type Solution = Vec<CellValue>;

/// Immutable grid geometry. Supports genuinely rectangular grids; `box_rows`/
/// `box_cols` are `Some` only when a regular box tiling evenly divides the
/// grid (the common square-Sudoku case), matching spec.md section 3.
#[derive(Debug, Copy, Clone)]
pub struct GridShape {
    pub num_rows: u32,
    pub num_cols: u32,
    pub num_values: u32,
    pub num_cells: usize,
    pub box_rows: Option<u32>,
    pub box_cols: Option<u32>,
}

impl GridShape {
    /// The common case: an `n x n` grid with `n = dim*dim`, box size `dim`.
    pub fn square(dim: u32) -> GridShape {
        let num_values = dim * dim;
        GridShape {
            num_rows: num_values,
            num_cols: num_values,
            num_values,
            num_cells: (num_values * num_values) as usize,
            box_rows: Some(dim),
            box_cols: Some(dim),
        }
    }

    /// A rectangular grid with no regular box tiling (jigsaw/irregular-region
    /// variants supply their own region list instead).
    pub fn rectangular(num_rows: u32, num_cols: u32, num_values: u32) -> GridShape {
        GridShape {
            num_rows,
            num_cols,
            num_values,
            num_cells: (num_rows * num_cols) as usize,
            box_rows: None,
            box_cols: None,
        }
    }

    #[inline]
    pub fn make_cell_index(&self, row: u32, col: u32) -> CellIndex {
        ((row * self.num_cols) + col) as CellIndex
    }

    #[inline]
    pub fn row_col(&self, cell: CellIndex) -> (u32, u32) {
        let cell = cell as u32;
        (cell / self.num_cols, cell % self.num_cols)
    }

    /// `numValues * (numValues + 1) / 2` — the maximum attainable cell-sum.
    pub fn max_sum(&self) -> u32 {
        self.num_values * (self.num_values + 1) / 2
    }

    pub fn all_values<VS: ValueSet>(&self) -> VS {
        VS::full(self.num_values as ValueType)
    }
}

/// The grid geometry plus initial givens. The full tagged constraint tree
/// lives in `constraint.rs`; every tree resolves down to this pair plus a
/// handler list.
pub struct Constraint {
    pub shape: GridShape,
    pub fixed_values: FixedValues,
    pub sudoku_x: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_shape_cell_indexing_round_trips() {
        let shape = GridShape::square(3);
        assert_eq!(shape.num_values, 9);
        assert_eq!(shape.num_cells, 81);
        for r in 0..shape.num_rows {
            for c in 0..shape.num_cols {
                let idx = shape.make_cell_index(r, c);
                assert_eq!(shape.row_col(idx), (r, c));
            }
        }
    }

    #[test]
    fn max_sum_matches_gauss_formula() {
        let shape = GridShape::square(3);
        assert_eq!(shape.max_sum(), 45);
    }
}
