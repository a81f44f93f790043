//! Per-`num_values` precomputed arrays (spec.md section 3), memoized in a
//! process-wide cache the way the teacher memoizes its compiled regexes in
//! `io/parser.rs` with `lazy_static!` — here the cache key is `num_values`
//! rather than being a single static, since a process may solve puzzles of
//! more than one grid size.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;

use crate::types::ValueType;
use crate::value_set::{Mask16, ValueSet};

pub struct LookupTables {
    pub num_values: ValueType,
    /// `value[mask]` — the value of a singleton mask, 0 otherwise (1-based
    /// display value; 0 means "not a singleton").
    pub value: Vec<ValueType>,
    /// `count[mask]` — popcount.
    pub count: Vec<u8>,
    /// `sum[mask]` — sum of the display-values present in the mask.
    pub sum: Vec<u32>,
    /// `reverse[mask]` — mask with bits reversed within `num_values`.
    pub reverse: Vec<u16>,
    /// `min_max[mask]` — `(min, max)` display value pair; `(0, 0)` if empty.
    pub min_max: Vec<(ValueType, ValueType)>,
    /// `combinations_for_count_and_sum[n][s]` — every mask of exactly `n`
    /// distinct values summing to display-value-sum `s`.
    combinations_for_count_and_sum: Vec<HashMap<u32, Vec<Mask16>>>,
}

impl LookupTables {
    fn build(num_values: ValueType) -> LookupTables {
        let full = 1usize << num_values;
        let mut value = vec![0; full];
        let mut count = vec![0; full];
        let mut sum = vec![0u32; full];
        let mut reverse = vec![0u16; full];
        let mut min_max = vec![(0, 0); full];

        for mask in 0..full {
            let bits = mask as u16;
            let popcount = bits.count_ones() as u8;
            count[mask] = popcount;
            if popcount == 1 {
                value[mask] = bits.trailing_zeros() as ValueType + 1;
            }

            let mut s = 0u32;
            let mut lo: Option<ValueType> = None;
            let mut hi: ValueType = 0;
            for v in 0..num_values {
                if bits & (1 << v) != 0 {
                    let display = v + 1;
                    s += display as u32;
                    lo.get_or_insert(display);
                    hi = display;
                }
            }
            sum[mask] = s;
            min_max[mask] = (lo.unwrap_or(0), hi);

            let mut rev = 0u16;
            for v in 0..num_values {
                if bits & (1 << v) != 0 {
                    rev |= 1 << (num_values - 1 - v);
                }
            }
            reverse[mask] = rev;
        }

        let mut combinations_for_count_and_sum: Vec<HashMap<u32, Vec<Mask16>>> =
            vec![HashMap::new(); num_values as usize + 1];
        for mask in 0..full {
            let n = count[mask] as usize;
            if n == 0 {
                continue;
            }
            combinations_for_count_and_sum[n]
                .entry(sum[mask])
                .or_default()
                .push(Mask16::from_bits(mask as u16));
        }

        LookupTables {
            num_values,
            value,
            count,
            sum,
            reverse,
            min_max,
            combinations_for_count_and_sum,
        }
    }

    /// Every mask of exactly `count` distinct values whose display-values sum
    /// to `target_sum`. Empty slice (not an error) when none exist — callers
    /// treat that as a sum-handler contradiction, per spec.md section 7's
    /// "resource exhaustion...treat as contradiction" guidance.
    pub fn combinations_for_count_and_sum(&self, count: usize, target_sum: u32) -> &[Mask16] {
        self.combinations_for_count_and_sum
            .get(count)
            .and_then(|by_sum| by_sum.get(&target_sum))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

lazy_static! {
    static ref CACHE: Mutex<HashMap<ValueType, Arc<LookupTables>>> = Mutex::new(HashMap::new());
}

/// Returns the memoized lookup tables for `num_values`, building them on
/// first use. Immutable once built, so callers may clone the `Arc` and hold
/// it for the lifetime of a solve without further locking.
pub fn lookup_tables(num_values: ValueType) -> Arc<LookupTables> {
    let mut cache = CACHE.lock().unwrap();
    cache
        .entry(num_values)
        .or_insert_with(|| Arc::new(LookupTables::build(num_values)))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_masks_report_their_value() {
        let tables = lookup_tables(9);
        for v in 0..9u8 {
            let mask = 1usize << v;
            assert_eq!(tables.value[mask], v + 1);
            assert_eq!(tables.count[mask], 1);
        }
    }

    #[test]
    fn sum_matches_brute_force() {
        let tables = lookup_tables(6);
        for mask in 0..(1usize << 6) {
            let expected: u32 = (0..6u8)
                .filter(|&v| mask & (1 << v) != 0)
                .map(|v| (v + 1) as u32)
                .sum();
            assert_eq!(tables.sum[mask], expected);
        }
    }

    #[test]
    fn combinations_for_count_and_sum_are_internally_consistent() {
        let tables = lookup_tables(9);
        for mask in tables.combinations_for_count_and_sum(3, 15) {
            assert_eq!(tables.count[mask.to_bits() as usize], 3);
            assert_eq!(tables.sum[mask.to_bits() as usize], 15);
        }
        assert!(!tables.combinations_for_count_and_sum(3, 15).is_empty());
    }

    #[test]
    fn reverse_is_its_own_inverse() {
        let tables = lookup_tables(9);
        for mask in 0..(1usize << 9) {
            let once = tables.reverse[mask];
            let twice = tables.reverse[once as usize];
            assert_eq!(twice as usize, mask);
        }
    }
}
