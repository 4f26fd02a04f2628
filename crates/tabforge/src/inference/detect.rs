//! Column type detection.
//!
//! A column is classified by trying each candidate type over every value and
//! checking the share of values that parse:
//!
//! 1. `date` when at least [`DATE_THRESHOLD`] of the values parse as dates;
//! 2. `integer` or `decimal` when at least [`NUMERIC_THRESHOLD`] parse as numbers
//!    (`integer` only if every parsed number is whole);
//! 3. `text` otherwise.
//!
//! Values that fail to parse under the chosen type become [`Value::Null`]. Parse
//! failures are never reported.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::schema::{ColumnType, Value};

/// Minimum share of parseable dates for a column to be classified as `date`.
pub const DATE_THRESHOLD: f64 = 0.30;

/// Minimum share of parseable numbers for a column to be classified as numeric.
pub const NUMERIC_THRESHOLD: f64 = 0.50;

// Shapes a string must have before any date format is attempted.
static DATE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/.]\d{1,2}").unwrap(), // year first
        Regex::new(r"^\d{1,2}:\d{2}").unwrap(),     // time of day
        Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\b")
            .unwrap(),
    ]
});

// Numeric dates with the year last: `15/01/2024`, `01-02-24 10:30`.
static YEAR_LAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})(?:[ T](.+))?$").unwrap()
});

static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{2})$").unwrap());

static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]+\s+\d{4}$").unwrap());

static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?$").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%d-%b-%Y",
    "%a, %d %b %Y",
    "%A, %B %d, %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Reading of numeric dates with the year last, such as `01/02/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOrder {
    /// `01/02/2024` is January 2.
    MonthFirst,
    /// `01/02/2024` is February 1.
    DayFirst,
}

/// Thresholds used by the type detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
    /// Minimum share of values parsed as dates (0.0-1.0).
    pub date_threshold: f64,
    /// Minimum share of values parsed as numbers (0.0-1.0).
    pub numeric_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            date_threshold: DATE_THRESHOLD,
            numeric_threshold: NUMERIC_THRESHOLD,
        }
    }
}

/// A parsed number, keeping integers exact.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Whole-valued numbers that fit in an `i64`.
    fn as_whole(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i),
            Number::Float(f)
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Classifies columns and converts their values.
#[derive(Debug, Clone, Default)]
pub struct TypeDetector {
    config: InferenceConfig,
}

impl TypeDetector {
    /// Create a detector with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom thresholds.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Detect the column type and return the converted values.
    ///
    /// The output always has the same length as the input.
    pub fn infer(&self, values: Vec<Value>) -> (Vec<Value>, ColumnType) {
        let total = values.len();

        let order = detect_day_order(&values);
        let dates: Vec<Option<NaiveDateTime>> =
            values.iter().map(|v| date_value(v, order)).collect();
        if meets_threshold(count_some(&dates), total, self.config.date_threshold) {
            let converted = dates.into_iter().map(Value::from).collect();
            return (converted, ColumnType::Date);
        }

        let numbers: Vec<Option<Number>> = values.iter().map(number_value).collect();
        if meets_threshold(count_some(&numbers), total, self.config.numeric_threshold) {
            let all_whole = numbers.iter().flatten().all(|n| n.as_whole().is_some());

            if all_whole {
                let converted: Vec<Value> = numbers
                    .into_iter()
                    .map(|n| n.and_then(Number::as_whole).into())
                    .collect();
                return (converted, ColumnType::Integer);
            }

            let converted: Vec<Value> = numbers
                .into_iter()
                .map(|n| n.map(Number::as_f64).into())
                .collect();
            return (converted, ColumnType::Decimal);
        }

        let converted = values
            .into_iter()
            .map(|v| match v {
                Value::Text(s) => Value::Text(s),
                other => Value::Text(other.to_text()),
            })
            .collect();
        (converted, ColumnType::Text)
    }
}

/// Detect a column's type with the default thresholds.
///
/// # Example
///
/// ```
/// use tabforge::{infer_column_type, ColumnType, Value};
///
/// let values = vec![Value::from("1"), Value::from("2.5"), Value::from("3")];
/// let (converted, column_type) = infer_column_type(values);
///
/// assert_eq!(column_type, ColumnType::Decimal);
/// assert_eq!(converted[1], Value::Decimal(2.5));
/// ```
pub fn infer_column_type(values: Vec<Value>) -> (Vec<Value>, ColumnType) {
    TypeDetector::new().infer(values)
}

fn count_some<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_some()).count()
}

/// At least one value parsed and the parsed share reaches the threshold.
fn meets_threshold(parsed: usize, total: usize, threshold: f64) -> bool {
    parsed > 0 && parsed as f64 / total as f64 >= threshold
}

fn date_value(value: &Value, order: Option<DayOrder>) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_datetime_with(s, order),
        _ => None,
    }
}

fn number_value(value: &Value) -> Option<Number> {
    match value {
        Value::Integer(i) => Some(Number::Int(*i)),
        Value::Decimal(d) if d.is_finite() => Some(Number::Float(*d)),
        Value::Text(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::Int(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

/// Day/month order of a column, decided by its first numeric year-last date
/// that can only be read one way (`13/02/2024` is day-first).
///
/// Returns `None` when every such date is ambiguous or there are none.
pub fn detect_day_order<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<DayOrder> {
    values
        .into_iter()
        .filter_map(Value::as_text)
        .find_map(|s| {
            let caps = YEAR_LAST.captures(s.trim())?;
            let first: u32 = caps[1].parse().ok()?;
            let second: u32 = caps[2].parse().ok()?;
            match (first > 12, second > 12) {
                (true, false) => Some(DayOrder::DayFirst),
                (false, true) => Some(DayOrder::MonthFirst),
                _ => None,
            }
        })
}

/// Parse a string as a date or date-time.
///
/// Accepts RFC 3339 / RFC 2822, ISO dates with optional time, slash, dash and
/// dot separated dates with the year first or last, English month names,
/// year-month (`2024-01`), month-year (`Jan 2024`) and a bare time of day.
/// Partial dates fall on the first of the month; a bare time falls on
/// 1970-01-01. Numeric strings are never dates. Time zone offsets are
/// dropped, keeping the wall-clock time.
///
/// Year-last dates are read month-first, then day-first if that is invalid.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    parse_datetime_with(s, None)
}

/// Parse a date like [`parse_datetime`], reading year-last dates in a fixed
/// `order` when one is given.
pub fn parse_datetime_with(s: &str, order: Option<DayOrder>) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.parse::<f64>().is_ok() {
        return None;
    }
    if let Some(caps) = YEAR_LAST.captures(trimmed) {
        return parse_year_last(&caps, order);
    }
    if !DATE_SHAPES.iter().any(|shape| shape.is_match(trimmed)) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_partial(trimmed))
}

fn parse_year_last(caps: &Captures<'_>, order: Option<DayOrder>) -> Option<NaiveDateTime> {
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;
    let time = match caps.get(4) {
        Some(m) => Some(parse_time(m.as_str().trim())?),
        None => None,
    };

    let orders: &[DayOrder] = match order {
        Some(DayOrder::MonthFirst) => &[DayOrder::MonthFirst],
        Some(DayOrder::DayFirst) => &[DayOrder::DayFirst],
        None => &[DayOrder::MonthFirst, DayOrder::DayFirst],
    };

    orders.iter().find_map(|order| {
        let (month, day) = match order {
            DayOrder::MonthFirst => (first, second),
            DayOrder::DayFirst => (second, first),
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(date.and_time(time.unwrap_or(NaiveTime::MIN)))
    })
}

/// Two-digit years: 69-99 are 19xx, 00-68 are 20xx.
fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    match digits.len() {
        2 if year >= 69 => Some(1900 + year),
        2 => Some(2000 + year),
        _ => Some(year),
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn parse_partial(s: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = YEAR_MONTH.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0);
    }
    if MONTH_YEAR.is_match(s) {
        return NaiveDate::parse_from_str(&format!("1 {}", s), "%d %b %Y")
            .ok()?
            .and_hms_opt(0, 0, 0);
    }
    if TIME_OF_DAY.is_match(s) {
        return Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(parse_time(s)?));
    }
    None
}
