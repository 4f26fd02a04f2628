//! Type inference, text normalization and quality statistics.

mod detect;
mod normalize;
mod statistical;

pub use detect::{
    DATE_THRESHOLD, DayOrder, InferenceConfig, NUMERIC_THRESHOLD, TypeDetector,
    detect_day_order, infer_column_type, parse_datetime, parse_datetime_with,
};
pub use normalize::{normalize_column, normalize_text, strip_diacritics};
pub use statistical::{QualityAnalyzer, analyze_quality};
