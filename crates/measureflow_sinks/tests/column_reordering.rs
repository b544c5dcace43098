//! Property test for the GNUPLOT backend's column-reordering invariant
//! (spec.md P7): whatever order a row's columns arrive in, writing it
//! through [`FileFormatWriter`] must reorder it to match the column order
//! fixed by the first row of the run.

use std::collections::HashSet;
use std::fs;

use measureflow_protocol::{Row, RowValue};
use measureflow_sinks::FileFormatWriter;
use proptest::prelude::*;
use tempfile::tempdir;

/// Fisher-Yates over `names`, keyed on `seed` so proptest can shrink it
/// like any other input instead of reaching for an RNG of its own.
fn shuffled(names: &[String], seed: u64) -> Vec<String> {
    let mut indices: Vec<usize> = (0..names.len()).collect();
    let mut state = seed | 1;
    for i in (1..indices.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = (state >> 33) as usize % (i + 1);
        indices.swap(i, j);
    }
    indices.into_iter().map(|i| names[i].clone()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any set of distinct column names and any permutation of them, a
    /// row built in that permuted order is written back out in the order
    /// fixed by the header, not the order the row happened to arrive in.
    #[test]
    fn row_is_always_reordered_to_the_header_column_order(
        names in prop::collection::hash_set("[a-z]{1,6}", 1..8)
            .prop_map(|set: HashSet<String>| set.into_iter().collect::<Vec<_>>()),
        seed in any::<u64>(),
    ) {
        let header_order = names.clone();
        let permuted = shuffled(&names, seed);

        let dir = tempdir().unwrap();
        let base = dir.path().join("run");

        let mut writer = FileFormatWriter::for_format("GNUPLOT").unwrap();
        writer.start_new_file(&base).unwrap();
        writer.set_column_names(header_order.clone());
        writer.write_header().unwrap();

        let row = Row::new(
            permuted
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), RowValue::Int(i as i64)))
                .collect(),
        );
        writer.write_row(&row).unwrap();
        drop(writer);

        let contents = fs::read_to_string(base.with_extension("dat")).unwrap();
        let mut lines = contents.lines();
        let header_line = lines.next().unwrap();
        let data_line = lines.next().unwrap();

        prop_assert_eq!(header_line, header_order.join(" "));

        let expected: Vec<i64> = header_order
            .iter()
            .map(|name| permuted.iter().position(|n| n == name).unwrap() as i64)
            .collect();
        let actual: Vec<i64> = data_line
            .split(' ')
            .map(|v| v.parse().unwrap())
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
