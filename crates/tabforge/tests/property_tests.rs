//! Property-based tests for column inference, normalization and deduplication.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p tabforge --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p tabforge --test property_tests
//! ```

use proptest::prelude::*;

use tabforge::inference::{normalize_text, parse_datetime, strip_diacritics};
use tabforge::{Column, ColumnType, Table, Value, drop_duplicates, infer_column_type};

// =============================================================================
// Test Strategies
// =============================================================================

/// Cell strings that mix numbers, dates, null tokens, accents and noise.
fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(|i| Value::text(i.to_string())),
        (-1.0e6..1.0e6f64).prop_map(|f| Value::text(format!("{:.3}", f))),
        (1990..2030i32, 1..=12u32, 1..=28u32)
            .prop_map(|(y, m, d)| Value::text(format!("{:04}-{:02}-{:02}", y, m, d))),
        (1..=12u32, 1..=28u32, 1990..2030i32)
            .prop_map(|(m, d, y)| Value::text(format!("{:02}/{:02}/{:04}", m, d, y))),
        "[a-zA-Z0-9áéíóúãõçÁÉÍÓÚÃÕÇ \\-\\.]{0,20}".prop_map(Value::text),
        any::<String>().prop_map(Value::text),
    ]
}

fn column() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(cell(), 0..60)
}

// =============================================================================
// Inference
// =============================================================================

proptest! {
    #[test]
    fn inference_preserves_length(values in column()) {
        let len = values.len();
        let (converted, _) = infer_column_type(values);
        prop_assert_eq!(converted.len(), len);
    }

    #[test]
    fn inference_is_deterministic(values in column()) {
        let first = infer_column_type(values.clone());
        let second = infer_column_type(values);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn converted_values_match_detected_type(values in column()) {
        let (converted, column_type) = infer_column_type(values);
        for value in &converted {
            let ok = match (column_type, value) {
                (ColumnType::Text, Value::Text(_)) => true,
                (ColumnType::Text, _) => false,
                (_, Value::Null) => true,
                (ColumnType::Date, Value::Date(_)) => true,
                (ColumnType::Integer, Value::Integer(_)) => true,
                (ColumnType::Decimal, Value::Decimal(d)) => d.is_finite(),
                _ => false,
            };
            prop_assert!(ok, "{:?} in {} column", value, column_type);
        }
    }

    #[test]
    fn integers_never_parse_as_dates(n in any::<i64>()) {
        prop_assert!(parse_datetime(&n.to_string()).is_none());
    }
}

// =============================================================================
// Normalization
// =============================================================================

proptest! {
    #[test]
    fn normalization_is_idempotent(s in any::<String>()) {
        let once = strip_diacritics(&s);
        prop_assert_eq!(strip_diacritics(&once), once.clone());
    }

    #[test]
    fn normalization_leaves_non_text_alone(i in any::<i64>()) {
        prop_assert_eq!(normalize_text(Value::Integer(i)), Value::Integer(i));
    }

    #[test]
    fn normalized_latin_text_is_ascii(s in "[a-zA-ZáàâãéêíóôõúüçÁÀÂÃÉÊÍÓÔÕÚÜÇ ]{0,30}") {
        prop_assert!(strip_diacritics(&s).is_ascii());
    }
}

// =============================================================================
// Deduplication
// =============================================================================

proptest! {
    #[test]
    fn dedup_leaves_unique_rows(rows in prop::collection::vec((0..4i64, "[ab]"), 0..40)) {
        let (numbers, letters): (Vec<i64>, Vec<String>) = rows.iter().cloned().unzip();
        let mut table = Table::with_columns(
            "t",
            vec![
                Column::new(
                    "n",
                    ColumnType::Integer,
                    numbers.into_iter().map(Value::Integer).collect(),
                ),
                Column::new(
                    "s",
                    ColumnType::Text,
                    letters.into_iter().map(Value::text).collect(),
                ),
            ],
        );

        let before = table.row_count();
        let removed = drop_duplicates(&mut table);
        prop_assert_eq!(table.row_count() + removed, before);

        // Dedup twice removes nothing more
        prop_assert_eq!(drop_duplicates(&mut table), 0);

        // First occurrences keep their relative order
        let mut expected: Vec<(i64, String)> = Vec::new();
        for row in rows {
            if !expected.contains(&row) {
                expected.push(row);
            }
        }
        let actual: Vec<(i64, String)> = table
            .rows()
            .map(|r| match (r[0], r[1]) {
                (Value::Integer(n), Value::Text(s)) => (*n, s.clone()),
                other => panic!("unexpected row {:?}", other),
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
