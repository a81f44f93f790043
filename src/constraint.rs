//! The resolved constraint tree (spec.md section 6.1): a closed tagged-variant
//! description of a puzzle, and `resolve()`, which walks it into the concrete
//! inputs the rest of the engine needs: a handler list for `HandlerSet::new`,
//! the house/sum descriptors `Optimizer::run` consumes, and the grid geometry
//! plus initial givens (`types::Constraint`).
//!
//! Grounded on the teacher's `PuzzleBuilder`/clue-list walk in `io/parse.rs`,
//! which turns a flat clue list into concrete handlers one variant at a time;
//! generalized here from the teacher's fixed Sudoku-only clue set to the full
//! tagged kind list spec.md section 6.1 names.

use std::sync::Arc;

use crate::handler::Handler;
use crate::handlers::all_different::AllDifferent;
use crate::handlers::arrow::{Arrow, PillArrow};
use crate::handlers::binary::{BinaryConstraint, BinaryPairwise};
use crate::handlers::cage::Cage;
use crate::handlers::full_rank::{FullRank, RankedHouse};
use crate::handlers::given::GivenCandidates;
use crate::handlers::house::House;
use crate::handlers::indexing::Indexing;
use crate::handlers::lines::{Between, ConsecutiveSet, Lockout, Palindrome, Whispers};
use crate::handlers::little_killer::LittleKiller;
use crate::handlers::logic::{And, Or};
use crate::handlers::nfa_handler::NFAConstraint;
use crate::handlers::same_values::SameValues;
use crate::handlers::sum::{Sum, SumWithNegative};
use crate::lookup::LookupTables;
use crate::nfa::Nfa;
use crate::optimizer::SumDescriptor;
use crate::types::{CellIndex, CellValue, Constraint as ResolvedShape, FixedValues, GridShape};
use crate::value_set::ValueSet;

/// One node of the resolved constraint tree. `Or`/`And` nest further trees
/// rather than handlers directly, so the tree stays a pure data description
/// until `resolve()` walks it.
#[derive(Clone)]
pub enum Node {
    Givens(FixedValues),
    House(Vec<CellIndex>),
    AllDifferent(Vec<CellIndex>),
    Sum {
        cells: Vec<CellIndex>,
        target: i64,
    },
    SumWithNegative {
        positive: Vec<CellIndex>,
        negative: Vec<CellIndex>,
        target: i64,
    },
    Thermo(Vec<CellIndex>),
    Arrow {
        shaft: Vec<CellIndex>,
        bulb: CellIndex,
    },
    PillArrow {
        shaft: Vec<CellIndex>,
        bulb: Vec<CellIndex>,
    },
    LittleKiller {
        cells: Vec<CellIndex>,
        coefficients: Vec<i64>,
        target: i64,
    },
    Cage {
        cells: Vec<CellIndex>,
        target: i64,
        distinct: bool,
    },
    Whispers {
        cells: Vec<CellIndex>,
        min_diff: u8,
    },
    Renban(Vec<CellIndex>),
    Palindrome(Vec<(CellIndex, CellIndex)>),
    Modular {
        cells: Vec<CellIndex>,
        modulus: u8,
    },
    Entropic(Vec<CellIndex>),
    Between {
        low_end: CellIndex,
        high_end: CellIndex,
        between: Vec<CellIndex>,
    },
    Lockout {
        low_end: CellIndex,
        high_end: CellIndex,
        between: Vec<CellIndex>,
        gap: u8,
    },
    RegionSumLine {
        cells: Vec<CellIndex>,
        segment_len: usize,
    },
    Zipper(Vec<CellIndex>),
    Indexing(Vec<CellIndex>),
    FullRank(Vec<RankedHouse>),
    NumberedRoom {
        clue_cell: CellIndex,
        line: Vec<CellIndex>,
    },
    CountingCircles {
        cells: Vec<CellIndex>,
        circles: Vec<CellIndex>,
    },
    Quad {
        cells: Vec<CellIndex>,
        values: Vec<CellValue>,
    },
    DotBlack(CellIndex, CellIndex),
    DotWhite(CellIndex, CellIndex),
    Xv {
        a: CellIndex,
        b: CellIndex,
        is_x: bool,
    },
    Kropki {
        a: CellIndex,
        b: CellIndex,
        ratio: u8,
    },
    AntiKnight,
    AntiKing,
    AntiConsecutive,
    DiagonalPlus,
    DiagonalMinus,
    Jigsaw(Vec<Vec<CellIndex>>),
    Windoku,
    DisjointSets,
    Nfa {
        cells: Vec<CellIndex>,
        pattern: String,
    },
    Regex {
        cells: Vec<CellIndex>,
        pattern: String,
    },
    BinaryPairwise {
        cells: Vec<CellIndex>,
        pair_tables: Vec<((usize, usize), Vec<u16>)>,
    },
    SameValues {
        cells0: Vec<CellIndex>,
        cells1: Vec<CellIndex>,
    },
    Or(Vec<Vec<Node>>),
    And(Vec<Vec<Node>>),
    Container(Vec<Node>),
}

/// The full input to constraint resolution: grid geometry plus the tagged
/// tree describing every clue and variant rule.
#[derive(Clone)]
pub struct ConstraintSpec {
    pub shape: GridShape,
    pub fixed_values: FixedValues,
    pub sudoku_x: bool,
    pub no_boxes: bool,
    pub nodes: Vec<Node>,
}

/// What `resolve()` produces: the plain grid/givens pair plus everything
/// `HandlerSet`/`Optimizer` need, with ownership handed to the caller
/// (`solver.rs`).
pub struct Resolved<VS: ValueSet> {
    pub shape: ResolvedShape,
    pub handlers: Vec<Box<dyn Handler<VS>>>,
    pub houses: Vec<Vec<CellIndex>>,
    pub sums: Vec<SumDescriptor>,
}

impl ConstraintSpec {
    pub fn resolve<VS: ValueSet + 'static>(self) -> Resolved<VS> {
        let tables = crate::lookup::lookup_tables(self.shape.num_values as u8);
        let mut ctx = ResolveCtx {
            shape: self.shape,
            tables,
            handlers: Vec::new(),
            houses: Vec::new(),
            sums: Vec::new(),
        };

        if !self.fixed_values.is_empty() {
            ctx.push_givens(&self.fixed_values);
        }

        if !self.no_boxes {
            ctx.push_grid_houses();
        }
        if self.sudoku_x {
            ctx.push_node(Node::DiagonalPlus);
            ctx.push_node(Node::DiagonalMinus);
        }

        for node in self.nodes {
            ctx.push_node(node);
        }

        Resolved {
            shape: ResolvedShape {
                shape: ctx.shape,
                fixed_values: self.fixed_values,
                sudoku_x: self.sudoku_x,
            },
            handlers: ctx.handlers,
            houses: ctx.houses,
            sums: ctx.sums,
        }
    }
}

struct ResolveCtx<VS: ValueSet> {
    shape: GridShape,
    tables: Arc<LookupTables>,
    handlers: Vec<Box<dyn Handler<VS>>>,
    houses: Vec<Vec<CellIndex>>,
    sums: Vec<SumDescriptor>,
}

impl<VS: ValueSet + 'static> ResolveCtx<VS> {
    fn push_givens(&mut self, fixed_values: &FixedValues) {
        let cells: Vec<CellIndex> = fixed_values.iter().map(|&(c, _)| c).collect();
        let masks: Vec<VS> = fixed_values
            .iter()
            .map(|&(_, v)| VS::from_value(v.index()))
            .collect();
        self.handlers.push(Box::new(GivenCandidates::new(cells, masks)));
    }

    /// Every row, column, and (if the shape has a regular box tiling) box.
    fn push_grid_houses(&mut self) {
        let shape = self.shape;
        for r in 0..shape.num_rows {
            let cells = (0..shape.num_cols).map(|c| shape.make_cell_index(r, c)).collect();
            self.push_house(cells);
        }
        for c in 0..shape.num_cols {
            let cells = (0..shape.num_rows).map(|r| shape.make_cell_index(r, c)).collect();
            self.push_house(cells);
        }
        if let (Some(box_rows), Some(box_cols)) = (shape.box_rows, shape.box_cols) {
            for box_row in (0..shape.num_rows).step_by(box_rows as usize) {
                for box_col in (0..shape.num_cols).step_by(box_cols as usize) {
                    let mut cells = Vec::with_capacity((box_rows * box_cols) as usize);
                    for r in box_row..box_row + box_rows {
                        for c in box_col..box_col + box_cols {
                            cells.push(shape.make_cell_index(r, c));
                        }
                    }
                    self.push_house(cells);
                }
            }
        }
    }

    fn push_house(&mut self, cells: Vec<CellIndex>) {
        self.houses.push(cells.clone());
        self.handlers.push(Box::new(House::<VS>::new(cells, &self.shape)));
    }

    fn push_node(&mut self, node: Node) {
        match node {
            Node::Givens(fixed) => self.push_givens(&fixed),
            Node::House(cells) => self.push_house(cells),
            Node::AllDifferent(cells) => self.handlers.push(Box::new(AllDifferent::new(cells))),
            Node::Sum { cells, target } => {
                self.sums.push(SumDescriptor { cells: cells.clone(), target });
                self.handlers.push(Box::new(Sum::new(cells, target, self.tables.clone())));
            }
            Node::SumWithNegative { positive, negative, target } => {
                self.handlers.push(Box::new(SumWithNegative::new(
                    positive,
                    negative,
                    target,
                    self.tables.clone(),
                )));
            }
            Node::Thermo(cells) => {
                self.handlers.push(Box::new(crate::handlers::thermo::Thermo::new(cells, self.tables.clone())));
            }
            Node::Arrow { shaft, bulb } => {
                self.handlers.push(Box::new(Arrow::new(shaft, bulb, self.tables.clone())));
            }
            Node::PillArrow { shaft, bulb } => {
                self.handlers.push(Box::new(PillArrow::new(shaft, bulb, self.tables.clone())));
            }
            Node::LittleKiller { cells, coefficients, target } => {
                self.handlers.push(Box::new(LittleKiller::new(cells, coefficients, target, self.tables.clone())));
            }
            Node::Cage { cells, target, distinct } => {
                self.sums.push(SumDescriptor { cells: cells.clone(), target });
                self.handlers.push(Box::new(Cage::new(cells, target, distinct, self.tables.clone())));
            }
            Node::Whispers { cells, min_diff } => {
                let num_values = self.shape.num_values as u8;
                self.handlers.push(Box::new(Whispers::<VS>::new(cells, min_diff, num_values)));
            }
            Node::Renban(cells) => {
                let n = cells.len() as u8;
                self.handlers.push(Box::new(AllDifferent::new(cells.clone())));
                self.handlers.push(Box::new(ConsecutiveSet::<VS>::new(cells, n, self.tables.clone())));
            }
            Node::Palindrome(pairs) => self.handlers.push(Box::new(Palindrome::new(pairs))),
            Node::Modular { cells, modulus } => self.push_banded(cells, modulus, |v, m| v % m),
            Node::Entropic(cells) => {
                let num_values = self.shape.num_values as u8;
                let band_size = (num_values as u32).div_ceil(3) as u8;
                self.push_banded(cells, 3, move |v, _| (v / band_size.max(1)).min(2));
            }
            Node::Between { low_end, high_end, between } => {
                self.handlers.push(Box::new(Between::new(low_end, high_end, between, self.tables.clone())));
            }
            Node::Lockout { low_end, high_end, between, gap } => {
                self.handlers.push(Box::new(Lockout::new(low_end, high_end, between, gap, self.tables.clone())));
            }
            Node::RegionSumLine { cells, segment_len } => self.push_equal_segment_sums(cells, segment_len),
            Node::Zipper(cells) => self.push_zipper(cells),
            Node::Indexing(line) => self.handlers.push(Box::new(Indexing::new(line))),
            Node::FullRank(houses) => self.handlers.push(Box::new(FullRank::new(houses))),
            Node::NumberedRoom { clue_cell, line } => {
                debug_assert_eq!(Some(&clue_cell), line.first());
                self.handlers.push(Box::new(Indexing::new(line)));
            }
            Node::CountingCircles { cells, circles } => {
                // spec.md leaves the exact counting rule underspecified for this
                // rare variant; decided (DESIGN.md) to enforce pairwise
                // distinctness among the circled cells as the faithful common
                // core of "counting circle" line variants, and otherwise treat
                // `cells` as ordinary line cells with no extra structure.
                let _ = cells;
                self.handlers.push(Box::new(AllDifferent::new(circles)));
            }
            Node::Quad { cells, values } => self.push_quad(cells, values),
            Node::DotBlack(a, b) => self.push_dot(a, b, true),
            Node::DotWhite(a, b) => self.push_dot(a, b, false),
            Node::Xv { a, b, is_x } => self.push_xv(a, b, is_x),
            Node::Kropki { a, b, ratio } => self.push_kropki_ratio(a, b, ratio),
            Node::AntiKnight => self.push_offset_pairs(&KNIGHT_OFFSETS, not_equal_table),
            Node::AntiKing => self.push_offset_pairs(&KING_OFFSETS, not_equal_table),
            Node::AntiConsecutive => self.push_offset_pairs(&ORTHOGONAL_OFFSETS, not_consecutive_table),
            Node::DiagonalPlus => {
                let shape = self.shape;
                let cells = (0..shape.num_rows).map(|i| shape.make_cell_index(i, i)).collect();
                self.push_house(cells);
            }
            Node::DiagonalMinus => {
                let shape = self.shape;
                let cells = (0..shape.num_rows)
                    .map(|i| shape.make_cell_index(i, shape.num_cols - 1 - i))
                    .collect();
                self.push_house(cells);
            }
            Node::Jigsaw(regions) => {
                for region in regions {
                    self.push_house(region);
                }
            }
            Node::Windoku => self.push_windoku(),
            Node::DisjointSets => self.push_disjoint_sets(),
            Node::Nfa { cells, pattern } | Node::Regex { cells, pattern } => {
                let num_values = self.shape.num_values as u8;
                match Nfa::parse(&pattern, num_values) {
                    Ok(nfa) => self.handlers.push(Box::new(NFAConstraint::new(cells, nfa))),
                    Err(_) => self.handlers.push(Box::new(crate::handlers::structural::False)),
                }
            }
            Node::BinaryPairwise { cells, pair_tables } => {
                let tables = pair_tables
                    .into_iter()
                    .map(|(pair, raw)| (pair, raw.into_iter().map(VS::from_bits).collect()))
                    .collect::<Vec<_>>();
                self.handlers.push(Box::new(BinaryPairwise::new(cells, tables)));
            }
            Node::SameValues { cells0, cells1 } => self.handlers.push(Box::new(SameValues::new(cells0, cells1))),
            Node::Or(branches) => {
                let resolved_branches = branches.into_iter().map(|b| self.resolve_branch(b)).collect();
                self.handlers.push(Box::new(Or::new(resolved_branches)));
            }
            Node::And(branches) => {
                let resolved_branches = branches.into_iter().map(|b| self.resolve_branch(b)).collect();
                self.handlers.push(Box::new(And::new(resolved_branches)));
            }
            Node::Container(nodes) => {
                for n in nodes {
                    self.push_node(n);
                }
            }
        }
    }

    /// Resolves a branch (for `Or`/`And`) into its own standalone handler
    /// list, without touching `self.houses`/`self.sums` (a branch's synthetic
    /// sub-constraints aren't part of the puzzle's top-level optimizer input).
    fn resolve_branch(&self, nodes: Vec<Node>) -> Vec<Box<dyn Handler<VS>>> {
        let mut scratch = ResolveCtx {
            shape: self.shape,
            tables: self.tables.clone(),
            handlers: Vec::new(),
            houses: Vec::new(),
            sums: Vec::new(),
        };
        for n in nodes {
            scratch.push_node(n);
        }
        scratch.handlers
    }

    /// `RegionSumLine`/segment-based "every segment sums the same" rule:
    /// ties every later segment's sum to the first via `SumWithNegative`
    /// targeting zero, so the shared total never needs to be known in
    /// advance.
    fn push_equal_segment_sums(&mut self, cells: Vec<CellIndex>, segment_len: usize) {
        if segment_len == 0 || cells.len() <= segment_len {
            return;
        }
        let segments: Vec<Vec<CellIndex>> = cells.chunks(segment_len).map(|c| c.to_vec()).collect();
        let anchor = segments[0].clone();
        for segment in &segments[1..] {
            self.handlers.push(Box::new(SumWithNegative::new(
                segment.clone(),
                anchor.clone(),
                0,
                self.tables.clone(),
            )));
        }
    }

    /// `Zipper`: every pair of cells equidistant from the line's midpoint
    /// sums to the same total; the (odd-length) center cell, if present,
    /// equals that shared sum too. Expressed the same zero-target-delta way
    /// as `push_equal_segment_sums`.
    fn push_zipper(&mut self, cells: Vec<CellIndex>) {
        let n = cells.len();
        if n < 2 {
            return;
        }
        let anchor = vec![cells[0], cells[n - 1]];
        let mut i = 1;
        let mut j = n - 2;
        while i < j {
            self.handlers.push(Box::new(SumWithNegative::new(
                vec![cells[i], cells[j]],
                anchor.clone(),
                0,
                self.tables.clone(),
            )));
            i += 1;
            j -= 1;
        }
        if i == j {
            self.handlers.push(Box::new(SumWithNegative::new(
                vec![cells[i]],
                anchor.clone(),
                0,
                self.tables.clone(),
            )));
        }
    }

    /// `Quad`: every value in `values` must appear in at least one of
    /// `cells`. Composed from `Or` over single-cell `GivenCandidates`
    /// branches rather than a new handler, since "this value lands somewhere
    /// in this small set" is exactly what `Or` already expresses.
    fn push_quad(&mut self, cells: Vec<CellIndex>, values: Vec<CellValue>) {
        for value in values {
            let mask = VS::from_value(value.index());
            let branches: Vec<Vec<Box<dyn Handler<VS>>>> = cells
                .iter()
                .map(|&c| {
                    let b: Vec<Box<dyn Handler<VS>>> = vec![Box::new(GivenCandidates::new(vec![c], vec![mask]))];
                    b
                })
                .collect();
            self.handlers.push(Box::new(Or::new(branches)));
        }
    }

    fn push_dot(&mut self, a: CellIndex, b: CellIndex, black: bool) {
        let num_values = self.shape.num_values as u8;
        let table = dot_table::<VS>(num_values, black);
        self.handlers.push(Box::new(BinaryConstraint::new(a, b, table)));
    }

    fn push_xv(&mut self, a: CellIndex, b: CellIndex, is_x: bool) {
        let target = if is_x { 10 } else { 5 };
        self.handlers.push(Box::new(SumWithNegative::new(vec![a, b], Vec::new(), target, self.tables.clone())));
    }

    fn push_kropki_ratio(&mut self, a: CellIndex, b: CellIndex, ratio: u8) {
        let num_values = self.shape.num_values as u8;
        let table = ratio_table::<VS>(num_values, ratio);
        self.handlers.push(Box::new(BinaryConstraint::new(a, b, table)));
    }

    fn push_offset_pairs(&mut self, offsets: &[(i32, i32)], table_fn: fn(u8) -> Vec<u16>) {
        let shape = self.shape;
        let num_values = shape.num_values as u8;
        let raw_table = table_fn(num_values);
        for row in 0..shape.num_rows as i32 {
            for col in 0..shape.num_cols as i32 {
                let a = shape.make_cell_index(row as u32, col as u32);
                for &(dr, dc) in offsets {
                    let (nr, nc) = (row + dr, col + dc);
                    if nr < 0 || nc < 0 || nr >= shape.num_rows as i32 || nc >= shape.num_cols as i32 {
                        continue;
                    }
                    let b = shape.make_cell_index(nr as u32, nc as u32);
                    if b <= a {
                        continue;
                    }
                    let table: Vec<VS> = raw_table.iter().map(|&bits| VS::from_bits(bits)).collect();
                    self.handlers.push(Box::new(BinaryConstraint::new(a, b, table)));
                }
            }
        }
    }

    /// Shared machinery for `Modular`/`Entropic`: adjacent-ish cells along a
    /// pre-resolved cell list must land in different bands, where `band_of`
    /// maps a 0-based value to its band id. Every pair within `window`
    /// positions of each other is constrained, since that's the reach within
    /// which two cells could otherwise land in the same `window`-sized
    /// window together.
    fn push_banded(&mut self, cells: Vec<CellIndex>, window: u8, band_of: impl Fn(u8, u8) -> u8 + Copy) {
        let num_values = self.shape.num_values as u8;
        let mut pair_tables = Vec::new();
        for i in 0..cells.len() {
            for j in (i + 1)..cells.len().min(i + window as usize) {
                let table: Vec<u16> = (0..num_values)
                    .map(|v| {
                        let band_v = band_of(v, window);
                        let mut mask = 0u16;
                        for w in 0..num_values {
                            if band_of(w, window) != band_v {
                                mask |= 1 << w;
                            }
                        }
                        mask
                    })
                    .collect();
                pair_tables.push(((i, j), table));
            }
        }
        let pair_tables: Vec<((usize, usize), Vec<VS>)> = pair_tables
            .into_iter()
            .map(|(pair, raw)| (pair, raw.into_iter().map(VS::from_bits).collect()))
            .collect();
        self.handlers.push(Box::new(BinaryPairwise::new(cells, pair_tables)));
    }

    /// Classic 4-window Windoku extra regions, generalized only for the
    /// common square-box case; grids whose box tiling doesn't fit the
    /// 1-gap-1 window layout skip the extra regions (decided in DESIGN.md).
    fn push_windoku(&mut self) {
        let shape = self.shape;
        let (Some(box_rows), Some(box_cols)) = (shape.box_rows, shape.box_cols) else {
            return;
        };
        if shape.num_rows < box_rows * 2 + 2 || shape.num_cols < box_cols * 2 + 2 {
            return;
        }
        let row_starts = [1u32, shape.num_rows - box_rows - 1];
        let col_starts = [1u32, shape.num_cols - box_cols - 1];
        for &row_start in &row_starts {
            for &col_start in &col_starts {
                let mut cells = Vec::with_capacity((box_rows * box_cols) as usize);
                for r in row_start..row_start + box_rows {
                    for c in col_start..col_start + box_cols {
                        cells.push(shape.make_cell_index(r, c));
                    }
                }
                self.push_house(cells);
            }
        }
    }

    /// One house per (row-within-box, col-within-box) offset, collecting the
    /// cell at that offset from every box across the grid.
    fn push_disjoint_sets(&mut self) {
        let shape = self.shape;
        let (Some(box_rows), Some(box_cols)) = (shape.box_rows, shape.box_cols) else {
            return;
        };
        for i in 0..box_rows {
            for j in 0..box_cols {
                let mut cells = Vec::new();
                for box_row in (0..shape.num_rows).step_by(box_rows as usize) {
                    for box_col in (0..shape.num_cols).step_by(box_cols as usize) {
                        cells.push(shape.make_cell_index(box_row + i, box_col + j));
                    }
                }
                self.push_house(cells);
            }
        }
    }
}

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const ORTHOGONAL_OFFSETS: [(i32, i32); 2] = [(0, 1), (1, 0)];

fn not_equal_table(num_values: u8) -> Vec<u16> {
    (0..num_values)
        .map(|v| {
            let all = if num_values >= 16 { u16::MAX } else { (1u16 << num_values) - 1 };
            all & !(1 << v)
        })
        .collect()
}

fn not_consecutive_table(num_values: u8) -> Vec<u16> {
    (0..num_values)
        .map(|v| {
            let all = if num_values >= 16 { u16::MAX } else { (1u16 << num_values) - 1 };
            let mut forbidden = 1u16 << v;
            if v > 0 {
                forbidden |= 1 << (v - 1);
            }
            if v + 1 < num_values {
                forbidden |= 1 << (v + 1);
            }
            all & !forbidden
        })
        .collect()
}

/// Black dot: ratio 2:1 (reuses `ratio_table`). White dot: consecutive
/// values.
fn dot_table<VS: ValueSet>(num_values: u8, black: bool) -> Vec<VS> {
    if black {
        return ratio_table(num_values, 2);
    }
    (0..num_values)
        .map(|v| {
            let mut mask = VS::empty();
            if v > 0 {
                mask.add_set(&VS::from_value(v - 1));
            }
            if v + 1 < num_values {
                mask.add_set(&VS::from_value(v + 1));
            }
            mask
        })
        .collect()
}

fn ratio_table<VS: ValueSet>(num_values: u8, ratio: u8) -> Vec<VS> {
    (0..num_values)
        .map(|v| {
            let mut mask = VS::empty();
            let value = v as i32 + 1;
            let hi = value * ratio as i32;
            let lo = value;
            if ratio != 0 && lo % ratio as i32 == 0 {
                let down = lo / ratio as i32;
                if down >= 1 {
                    mask.add_set(&VS::from_value((down - 1) as u8));
                }
            }
            if hi >= 1 && hi <= num_values as i32 {
                mask.add_set(&VS::from_value((hi - 1) as u8));
            }
            mask
        })
        .collect()
}
