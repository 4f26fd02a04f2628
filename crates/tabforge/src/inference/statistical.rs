//! Per-column quality statistics.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::schema::{
    Column, ColumnQuality, ColumnType, DateStatistics, NumericStatistics, Table, TableQuality,
    format_iso,
};

// =============================================================================
// STREAMING STATISTICS
// =============================================================================
// Single pass for min/max/sum; values are kept for the exact median.

#[derive(Debug, Clone, Default)]
struct StreamingStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    values: Vec<f64>,
}

impl StreamingStats {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        }
        self.count += 1;
        self.sum += value;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.values.push(value);
    }

    fn median(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        self.values.sort_by(|a, b| a.total_cmp(b));

        let mid = self.values.len() / 2;
        if self.values.len() % 2 == 0 {
            Some((self.values[mid - 1] + self.values[mid]) / 2.0)
        } else {
            Some(self.values[mid])
        }
    }

    fn to_numeric_statistics(&mut self) -> NumericStatistics {
        if self.count == 0 {
            return NumericStatistics {
                min: None,
                max: None,
                mean: None,
                median: None,
            };
        }

        NumericStatistics {
            min: Some(self.min),
            max: Some(self.max),
            mean: Some(self.sum / self.count as f64),
            median: self.median(),
        }
    }
}

/// Computes quality summaries for processed tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Summarize every column of a table.
    pub fn analyze_table(&self, table: &Table) -> TableQuality {
        let columns = table
            .columns
            .iter()
            .map(|c| (c.name.clone(), self.analyze_column(c)))
            .collect::<IndexMap<_, _>>();

        TableQuality {
            table: table.name.clone(),
            total_records: table.row_count(),
            total_columns: table.column_count(),
            columns,
        }
    }

    /// Summarize one column.
    pub fn analyze_column(&self, column: &Column) -> ColumnQuality {
        let total = column.len();
        let null_count = column.null_count();

        let unique_count = column
            .values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.key())
            .collect::<HashSet<_>>()
            .len();

        let completeness = if total == 0 {
            0.0
        } else {
            round2((1.0 - null_count as f64 / total as f64) * 100.0)
        };

        let numeric = match column.column_type {
            ColumnType::Integer | ColumnType::Decimal => {
                let mut stats = StreamingStats::default();
                for value in column.values.iter().filter_map(|v| v.as_f64()) {
                    stats.add(value);
                }
                Some(stats.to_numeric_statistics())
            }
            _ => None,
        };

        let dates = match column.column_type {
            ColumnType::Date => {
                let mut dates = column.values.iter().filter_map(|v| v.as_datetime());
                let first = dates.next();
                let (min, max) = dates.fold((first, first), |(lo, hi), d| {
                    (lo.map(|l| l.min(d)), hi.map(|h| h.max(d)))
                });
                Some(DateStatistics {
                    min_date: min.as_ref().map(format_iso),
                    max_date: max.as_ref().map(format_iso),
                })
            }
            _ => None,
        };

        ColumnQuality {
            detected_type: column.column_type,
            null_count,
            unique_count,
            completeness,
            numeric,
            dates,
        }
    }
}

/// Summarize every column of a table with the default analyzer.
pub fn analyze_quality(table: &Table) -> TableQuality {
    QualityAnalyzer::new().analyze_table(table)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
