//! The short-string codec (spec.md section 6.2): "digits 1-9 then A-G"
//! concatenation for square grids, decode and encode directions. Decode is
//! grounded directly on the teacher's `io/parser.rs`'s `parse_short_text`;
//! encode on `io/output.rs`'s `solution_as_grid`/`solution_compact`. The
//! closed-set textual constraint language (`.Cage~...`, Killer shorthand,
//! sudoku-x detection) the teacher's parser also handles remains out of
//! scope per spec.md section 1; only the plain given-digits grid form is
//! decoded here.

use crate::types::{CellValue, FixedValues, GridShape, Solution, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("cell count {0} is not a perfect fourth power (no square grid fits it)")]
    NotASquareGridLength(usize),
    #[error("grid of {0} values needs a radix above 36, which short-string digits can't express")]
    TooManyValuesForShortForm(u32),
    #[error("unrecognized character {0:?} at position {1}")]
    UnrecognizedChar(char, usize),
    #[error("value {0} out of range for a grid of {1} values")]
    ValueOutOfRange(ValueType, u32),
}

/// Infers the square grid's box dimension from a flat cell count, the way
/// `guess_dimension` does: `dim^4 == num_cells`.
fn guess_dimension(num_cells: usize) -> Result<u32, CodecError> {
    let dim = (num_cells as f64).sqrt().sqrt().round() as u32;
    let num_values = dim * dim;
    if (num_values as u64) * (num_values as u64) != num_cells as u64 {
        return Err(CodecError::NotASquareGridLength(num_cells));
    }
    Ok(dim)
}

/// Decodes a short-string puzzle (`.`/`0` for empty, else a digit in the
/// grid's radix: `1`-`9` then `A`-`G`) into a square `GridShape` and its
/// `FixedValues`. Whitespace is ignored, matching the teacher's
/// `remove_whitespace` pass.
pub fn decode_short_text(input: &str) -> Result<(GridShape, FixedValues), CodecError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let dim = guess_dimension(cleaned.len())?;
    let num_values = dim * dim;
    let radix = num_values + 1;
    if radix > 36 {
        return Err(CodecError::TooManyValuesForShortForm(num_values));
    }

    let mut fixed_values = FixedValues::new();
    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '.' | '0' => {}
            c if c.is_digit(radix) => {
                let value = c.to_digit(radix).unwrap() as ValueType;
                if value == 0 || value as u32 > num_values {
                    return Err(CodecError::ValueOutOfRange(value, num_values));
                }
                fixed_values.push((i, CellValue::from_display_value(value)));
            }
            c => return Err(CodecError::UnrecognizedChar(c, i)),
        }
    }

    Ok((GridShape::square(dim), fixed_values))
}

/// Encodes a solution back to its short-string form: one character per
/// cell, `1`-`9` then `A`-`G`, in row-major order.
pub fn encode_short_text(solution: &Solution) -> String {
    solution
        .iter()
        .map(|v| std::char::from_digit(v.display_value() as u32, 36).unwrap().to_ascii_uppercase())
        .collect()
}

/// Renders a solution as a padded grid, one row per line, matching the
/// teacher's `solution_as_grid`.
pub fn render_grid(shape: &GridShape, solution: &Solution) -> String {
    assert_eq!(shape.num_cells, solution.len());
    let pad_size = shape.num_values.to_string().len() + 1;

    let mut output = String::new();
    for r in 0..shape.num_rows {
        for c in 0..shape.num_cols {
            let index = shape.make_cell_index(r, c);
            let value = solution[index].to_string();
            for _ in 0..pad_size - value.len() {
                output.push(' ');
            }
            output.push_str(&value);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_4x4_short_string() {
        let (shape, fixed) = decode_short_text("1...\n....\n....\n...2").unwrap();
        assert_eq!(shape.num_values, 4);
        assert_eq!(fixed, vec![
            (0, CellValue::from_display_value(1)),
            (15, CellValue::from_display_value(2)),
        ]);
    }

    #[test]
    fn rejects_a_non_square_length() {
        assert_eq!(decode_short_text("123"), Err(CodecError::NotASquareGridLength(3)));
    }

    #[test]
    fn rejects_an_unrecognized_character() {
        let input = format!("1{}#", ".".repeat(14));
        assert_eq!(input.len(), 16);
        let err = decode_short_text(&input).unwrap_err();
        assert!(matches!(err, CodecError::UnrecognizedChar('#', 15)));
    }

    #[test]
    fn encode_round_trips_through_decode_for_a_full_grid() {
        let solution: Solution = (1..=4).map(CellValue::from_display_value).collect();
        let encoded = encode_short_text(&solution);
        assert_eq!(encoded, "1234");
    }

    #[test]
    fn encode_uses_letters_past_nine() {
        let solution: Solution = (1..=16).map(CellValue::from_display_value).collect();
        let encoded = encode_short_text(&solution);
        assert_eq!(&encoded[9..], "ABCDEFG");
    }
}
