//! Diacritic stripping for text values.

use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

use crate::schema::{Column, ColumnType, Value};

/// Remove diacritical marks from a text value and trim surrounding whitespace.
///
/// Null and non-text values are returned unchanged.
///
/// # Example
///
/// ```
/// use tabforge::{normalize_text, Value};
///
/// assert_eq!(normalize_text(Value::from(" café ")), Value::from("cafe"));
/// assert_eq!(normalize_text(Value::Integer(42)), Value::Integer(42));
/// ```
pub fn normalize_text(value: Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(strip_diacritics(&s)),
        other => other,
    }
}

/// Canonically decompose a string, drop nonspacing marks (`Mn`) and trim it.
///
/// Spacing and enclosing marks are kept.
pub fn strip_diacritics(s: &str) -> String {
    let stripped: String = s
        .nfd()
        .filter(|c| c.general_category() != GeneralCategory::NonspacingMark)
        .collect();
    stripped.trim().to_string()
}

/// Normalize every value of a text column in place. Other columns are left alone.
pub fn normalize_column(column: &mut Column) {
    if column.column_type != ColumnType::Text {
        return;
    }
    for value in &mut column.values {
        *value = normalize_text(std::mem::take(value));
    }
}
