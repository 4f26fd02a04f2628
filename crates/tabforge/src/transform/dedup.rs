//! Stable removal of duplicate rows.

use std::collections::HashSet;

use crate::schema::{Table, ValueKey};

/// Remove rows equal across every column, keeping the first occurrence of each.
///
/// Returns the number of rows removed.
pub fn drop_duplicates(table: &mut Table) -> usize {
    let keep = {
        let mut seen: HashSet<Vec<ValueKey<'_>>> = HashSet::with_capacity(table.row_count());
        table
            .rows()
            .map(|row| seen.insert(row.into_iter().map(|v| v.key()).collect()))
            .collect::<Vec<bool>>()
    };

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        table.retain_rows(&keep);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, Value};

    fn table(letters: &[&str], numbers: &[i64]) -> Table {
        Table::with_columns(
            "t",
            vec![
                Column::new(
                    "letter",
                    ColumnType::Text,
                    letters.iter().map(|s| Value::from(*s)).collect(),
                ),
                Column::new(
                    "number",
                    ColumnType::Integer,
                    numbers.iter().map(|n| Value::Integer(*n)).collect(),
                ),
            ],
        )
    }

    #[test]
    fn test_drop_duplicates() {
        let mut t = table(&["a", "a", "b"], &[1, 1, 2]);
        let removed = drop_duplicates(&mut t);

        assert_eq!(removed, 1);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.row(0), vec![&Value::from("a"), &Value::Integer(1)]);
        assert_eq!(t.row(1), vec![&Value::from("b"), &Value::Integer(2)]);
    }

    #[test]
    fn test_partial_match_is_kept() {
        let mut t = table(&["a", "a", "a"], &[1, 2, 1]);
        assert_eq!(drop_duplicates(&mut t), 1);
        assert_eq!(t.column_names(), vec!["letter", "number"]);
        assert_eq!(t.columns[1].values, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_first_occurrence_order() {
        let mut t = table(&["c", "a", "c", "b", "a"], &[3, 1, 3, 2, 1]);
        assert_eq!(drop_duplicates(&mut t), 2);
        assert_eq!(
            t.columns[0].values,
            vec![Value::from("c"), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn test_null_rows_are_equal() {
        let mut t = Table::with_columns(
            "t",
            vec![Column::new("x", ColumnType::Integer, vec![Value::Null, Value::Null])],
        );
        assert_eq!(drop_duplicates(&mut t), 1);
    }
}
