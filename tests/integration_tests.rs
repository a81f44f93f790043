//! End-to-end coverage of the public `variant_sudoku` façade: a literal
//! solved puzzle, the boundary/round-trip laws, and the optimizer's
//! solution-preserving contract.

use variant_sudoku::{codec, Config, ConstraintSpec, ConstraintNode as Node, GridShape, Mask16, Solver};
use variant_sudoku::types::CellValue;
use variant_sudoku::value_set::ValueSet;
use variant_sudoku::search::CancelToken;

fn no_extra_nodes(shape: GridShape, fixed_values: variant_sudoku::FixedValues) -> ConstraintSpec {
    ConstraintSpec {
        shape,
        fixed_values,
        sudoku_x: false,
        no_boxes: false,
        nodes: Vec::new(),
    }
}

mod classic_nine_by_nine {
    use super::*;

    #[test]
    fn solves_the_textbook_puzzle() {
        let givens = "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
        let expected = "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

        let (shape, fixed_values) = codec::decode_short_text(givens).unwrap();
        let spec = no_extra_nodes(shape, fixed_values);
        let solver = Solver::<Mask16>::new(spec, Config::default()).unwrap();
        let solution = solver
            .nth_solution(0, CancelToken::new(), None)
            .expect("the textbook puzzle has a solution");

        assert_eq!(codec::encode_short_text(&solution), expected);
    }
}

mod boundary_behaviors {
    use super::*;

    /// "numValues = 1: the only valid grid is fully fixed; countSolutions ∈
    /// {0,1}."
    #[test]
    fn a_single_value_grid_has_exactly_one_solution() {
        let spec = no_extra_nodes(GridShape::square(1), Vec::new());
        let solver = Solver::<Mask16>::new(spec, Config::default()).unwrap();
        let count = solver
            .count_solutions(CancelToken::new(), None)
            .expect("search should not be cancelled");
        assert_eq!(count, 1);
    }

    /// "A 1-cell Sum with sum = v is equivalent to a GivenCandidates with
    /// mask 1<<(v-1)."
    #[test]
    fn one_cell_sum_matches_a_direct_given() {
        let shape = GridShape::square(2); // 4x4, values 1..=4
        let via_sum = {
            let mut spec = no_extra_nodes(shape, Vec::new());
            spec.nodes.push(Node::Sum { cells: vec![0], target: 3 });
            spec
        };
        let via_given = no_extra_nodes(shape, vec![(0, CellValue::from_display_value(3))]);

        let solver_a = Solver::<Mask16>::new(via_sum, Config::default()).unwrap();
        let solver_b = Solver::<Mask16>::new(via_given, Config::default()).unwrap();
        let count_a = solver_a.count_solutions(CancelToken::new(), None).unwrap();
        let count_b = solver_b.count_solutions(CancelToken::new(), None).unwrap();
        assert_eq!(count_a, count_b);
        assert!(count_a > 0);
    }

    /// "A 2-cell Sum is equivalent to a BinaryConstraint whose table lists
    /// (a,b) pairs with a+b = s and, if the cells mutually-exclude, a ≠ b."
    #[test]
    fn two_cell_sum_in_a_row_only_allows_distinct_pairs_summing_to_the_target() {
        let shape = GridShape::square(2); // 4x4, row 0 is cells 0..=3
        let target = 4i64; // sum=4 forces (1,3)/(3,1), excluding the equal-value (2,2) pair
        let mut spec = no_extra_nodes(shape, Vec::new());
        spec.nodes.push(Node::Sum { cells: vec![0, 1], target });

        let solver = Solver::<Mask16>::new(spec, Config::default()).unwrap();
        let marks = solver
            .solve_all_possibilities(CancelToken::new(), None)
            .expect("4x4 grid with a satisfiable row sum should have solutions");

        let expected_a: u16 = (1..=4u8)
            .filter(|&a| {
                let b = target - a as i64;
                (1..=4).contains(&b) && b as u8 != a
            })
            .map(|a| 1u16 << (a - 1))
            .fold(0, |acc, bit| acc | bit);
        let expected_b: u16 = (1..=4u8)
            .filter(|&b| {
                let a = target - b as i64;
                (1..=4).contains(&a) && a as u8 != b
            })
            .map(|b| 1u16 << (b - 1))
            .fold(0, |acc, bit| acc | bit);

        assert_eq!(marks[0].to_bits(), expected_a);
        assert_eq!(marks[1].to_bits(), expected_b);
    }

    /// "An Or handler with a single branch is equivalent to inlining that
    /// branch."
    #[test]
    fn or_with_a_single_branch_matches_the_inlined_branch() {
        let shape = GridShape::square(2);
        let branch = vec![Node::Givens(vec![(0, CellValue::from_display_value(2))])];

        let mut via_or = no_extra_nodes(shape, Vec::new());
        via_or.nodes.push(Node::Or(vec![branch.clone()]));
        let mut inlined = no_extra_nodes(shape, Vec::new());
        inlined.nodes.extend(branch);

        let count_or = Solver::<Mask16>::new(via_or, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        let count_inlined = Solver::<Mask16>::new(inlined, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        assert_eq!(count_or, count_inlined);
    }

    /// "An And with no branches is True."
    #[test]
    fn and_with_no_branches_leaves_the_grid_unconstrained() {
        let shape = GridShape::square(2);
        let baseline = no_extra_nodes(shape, Vec::new());
        let mut with_vacuous_and = no_extra_nodes(shape, Vec::new());
        with_vacuous_and.nodes.push(Node::And(Vec::new()));

        let baseline_count = Solver::<Mask16>::new(baseline, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        let and_count = Solver::<Mask16>::new(with_vacuous_and, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        assert_eq!(baseline_count, and_count);
    }
}

mod round_trip_and_idempotence {
    use super::*;
    use variant_sudoku::exclusions::CellExclusions;
    use variant_sudoku::grid::full_grid;
    use variant_sudoku::handler_set::HandlerSet;
    use variant_sudoku::search::{count_solutions, SearchEngine};

    /// Resolves `spec` and runs it through a `SearchEngine` without ever
    /// calling the optimizer, mirroring `Solver::new` minus its
    /// `Optimizer::run` step.
    fn count_without_optimizer(spec: ConstraintSpec) -> u64 {
        let resolved = spec.resolve::<Mask16>();
        let shape = resolved.shape.shape;
        let mut handler_set = HandlerSet::new(resolved.handlers);

        let mut probe_grid = full_grid::<Mask16>(shape.num_cells, shape.num_values as _);
        let exclusions = CellExclusions::build(shape.num_cells, &handler_set.exclusion_groups());
        handler_set
            .initialize_all(&mut probe_grid, &exclusions, &shape)
            .expect("resolved tree should not contradict itself");
        handler_set.post_initialize_all(&probe_grid);

        let mut engine = SearchEngine::new(
            &shape,
            &resolved.shape.fixed_values,
            handler_set,
            CancelToken::new(),
            None,
            1 << 10,
        );
        count_solutions(&mut engine).expect("search should not be cancelled")
    }

    /// "Adding an auxiliary (non-essential) handler produced by the
    /// optimizer does not change the solution set of its parent
    /// constraint."
    #[test]
    fn the_optimizer_never_changes_a_puzzles_solution_count() {
        let shape = GridShape::square(2); // 4x4
        let mut spec = no_extra_nodes(shape, Vec::new());
        spec.nodes.push(Node::Sum { cells: vec![0, 1], target: 5 });

        let without_optimizer = count_without_optimizer(spec.clone());
        let with_optimizer = Solver::<Mask16>::new(spec, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();

        assert_eq!(without_optimizer, with_optimizer);
    }

    /// "Permuting the declaration order of handlers does not change the
    /// solution set."
    #[test]
    fn reordering_constraint_nodes_preserves_the_solution_count() {
        let shape = GridShape::square(2);
        let forward_nodes = vec![
            Node::Sum { cells: vec![0, 1], target: 5 },
            Node::AllDifferent(vec![0, 2]),
        ];
        let mut reversed_nodes = forward_nodes.clone();
        reversed_nodes.reverse();

        let forward = {
            let mut s = no_extra_nodes(shape, Vec::new());
            s.nodes = forward_nodes;
            s
        };
        let reversed = {
            let mut s = no_extra_nodes(shape, Vec::new());
            s.nodes = reversed_nodes;
            s
        };

        let forward_count = Solver::<Mask16>::new(forward, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        let reversed_count = Solver::<Mask16>::new(reversed, Config::default())
            .unwrap()
            .count_solutions(CancelToken::new(), None)
            .unwrap();
        assert_eq!(forward_count, reversed_count);
    }
}
