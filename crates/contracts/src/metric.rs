//! Metric values - from raw recognized readings to store rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A reading as found in recognized text, before canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    /// Joined label window, may be empty
    pub label: String,
    /// Digits as printed, decimal comma kept
    pub number: String,
    /// Lower-cased unit token next to the number
    pub unit: Option<String>,
}

/// A measurement under its canonical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMetric {
    /// Canonical (or fallback) metric name
    pub name: String,

    /// Always finite
    pub value: f64,

    /// Unit token recognized next to the value, lower-cased
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl CanonicalMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        self.unit = if unit.is_empty() { None } else { Some(unit) };
        self
    }

    /// Name as recorded: the unit is appended in parentheses unless the
    /// canonical name already mentions it.
    pub fn display_name(&self) -> String {
        match &self.unit {
            Some(unit) if !self.name.to_lowercase().contains(&unit.to_lowercase()) => {
                format!("{} ({})", self.name, unit)
            }
            _ => self.name.clone(),
        }
    }
}

/// Keep the first metric per display name, preserving order of appearance
pub fn dedup_first_wins(metrics: Vec<CanonicalMetric>) -> Vec<CanonicalMetric> {
    let mut seen = HashSet::new();
    metrics
        .into_iter()
        .filter(|m| seen.insert(m.display_name()))
        .collect()
}

/// Parse a `YYYYMMDD` token, falling back to `today` when absent or invalid
pub fn resolve_capture_date(token: Option<&str>, today: NaiveDate) -> NaiveDate {
    token
        .and_then(|t| NaiveDate::parse_from_str(t, "%Y%m%d").ok())
        .unwrap_or(today)
}

/// One row of the external record store.
///
/// Equality is on the literal strings that get transmitted, value included
/// as rendered with two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadRow {
    /// ISO-8601 date
    pub date: String,
    pub metric: String,
    /// Value rendered with two decimals
    pub value: String,
    /// Source file name
    pub source: String,
}

impl UploadRow {
    pub fn new(
        date: impl Into<String>,
        metric: impl Into<String>,
        value: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            metric: metric.into(),
            value: value.into(),
            source: source.into(),
        }
    }

    /// Render a metric for a capture date and source file
    pub fn from_metric(date: NaiveDate, metric: &CanonicalMetric, source: &str) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            metric: metric.display_name(),
            value: format!("{:.2}", metric.value),
            source: source.to_string(),
        }
    }

    /// Row as the 4-column record sent to the store
    pub fn to_record(&self) -> [String; 4] {
        [
            self.date.clone(),
            self.metric.clone(),
            self.value.clone(),
            self.source.clone(),
        ]
    }

    pub fn from_record(record: [String; 4]) -> Self {
        let [date, metric, value, source] = record;
        Self {
            date,
            metric,
            value,
            source,
        }
    }
}
