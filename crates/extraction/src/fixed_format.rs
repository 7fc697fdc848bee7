//! FixedFormatExtractor - screens with fixed label words next to digit runs
//! (calorie dashboards: `1 850 Comido`, `Meta 2000`).

use contracts::{CanonicalMetric, FixedPattern};
use regex::Regex;
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::normalize::strip_diacritics;
use crate::value_rules::ValueNormalizer;

/// Digit run: a digit followed by 2..=6 digits or spaces
const DIGIT_RUN: &str = r"(\d[\d\s]{2,6})";

/// Max non-digit characters between a value and its label
const GAP: &str = r"[^\d]{0,10}";

#[derive(Debug, Clone)]
struct CompiledPattern {
    metric: String,
    value_first: Regex,
    label_first: Regex,
}

/// Extractor for a configured set of label words
#[derive(Debug, Clone)]
pub struct FixedFormatExtractor {
    patterns: Vec<CompiledPattern>,
    values: ValueNormalizer,
}

impl FixedFormatExtractor {
    /// Compile the label patterns.
    ///
    /// # Errors
    /// `ExtractionError::Pattern` if a label cannot be compiled.
    pub fn new(patterns: &[FixedPattern], values: ValueNormalizer) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let label = regex::escape(&strip_diacritics(&p.label));
                let compile = |src: String| {
                    Regex::new(&src).map_err(|e| ExtractionError::Pattern {
                        label: p.label.clone(),
                        message: e.to_string(),
                    })
                };
                Ok(CompiledPattern {
                    metric: p.metric.clone(),
                    value_first: compile(format!(r"(?i)\b{DIGIT_RUN}\b{GAP}{label}"))?,
                    label_first: compile(format!(r"(?i){label}{GAP}\b{DIGIT_RUN}\b"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns, values })
    }

    /// At most one metric per pattern, in pattern order. Missing labels are
    /// not an error.
    pub fn extract(&self, text: &str) -> Vec<CanonicalMetric> {
        let text = strip_diacritics(text);
        self.patterns
            .iter()
            .filter_map(|p| {
                let caps = p
                    .value_first
                    .captures(&text)
                    .or_else(|| p.label_first.captures(&text))?;
                let digits = repair_digits(&caps[1]);
                let raw = digits.parse::<f64>().ok()?;
                match self.values.normalize(&p.metric, raw) {
                    Ok(value) => Some(CanonicalMetric::new(p.metric.clone(), value)),
                    Err(rejected) => {
                        debug!(%rejected, "value dropped");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Undo common glyph confusions in a digit run and drop separators
pub fn repair_digits(run: &str) -> String {
    run.chars()
        .filter_map(|c| match c {
            'l' | 'I' | '|' => Some('1'),
            'O' | 'o' => Some('0'),
            ' ' | '.' | ',' => None,
            c if c.is_whitespace() => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FixedFormatExtractor {
        let patterns = vec![
            FixedPattern::new("Comido", "AMAZFIT_KCAL_COMIDO"),
            FixedPattern::new("Ejercicio", "AMAZFIT_KCAL_EJERCICIO"),
            FixedPattern::new("Restante", "AMAZFIT_KCAL_RESTANTE"),
            FixedPattern::new("Meta", "AMAZFIT_KCAL_META"),
        ];
        FixedFormatExtractor::new(&patterns, ValueNormalizer::default()).unwrap()
    }

    #[test]
    fn test_value_before_label() {
        let metrics = extractor().extract("1 250 Comido\n320 kcal Ejercicio");
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0], CanonicalMetric::new("AMAZFIT_KCAL_COMIDO", 1250.0));
        assert_eq!(metrics[1], CanonicalMetric::new("AMAZFIT_KCAL_EJERCICIO", 320.0));
    }

    #[test]
    fn test_label_before_value() {
        let metrics = extractor().extract("Meta: 2000");
        assert_eq!(metrics, vec![CanonicalMetric::new("AMAZFIT_KCAL_META", 2000.0)]);
    }

    #[test]
    fn test_value_first_binds_across_lines() {
        // a run ending a line binds to the label starting the next one
        let metrics = extractor().extract("Meta 2000\nRestante 1070");
        assert_eq!(metrics[0], CanonicalMetric::new("AMAZFIT_KCAL_RESTANTE", 2000.0));
        assert_eq!(metrics[1], CanonicalMetric::new("AMAZFIT_KCAL_META", 2000.0));
    }

    #[test]
    fn test_case_and_accents_ignored() {
        let metrics = extractor().extract("COMÍDO 845");
        assert_eq!(metrics, vec![CanonicalMetric::new("AMAZFIT_KCAL_COMIDO", 845.0)]);
    }

    #[test]
    fn test_absent_labels_yield_nothing() {
        assert!(extractor().extract("Pasos 8000\n").is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_short_runs_ignored() {
        assert!(extractor().extract("Meta 20").is_empty());
    }

    #[test]
    fn test_repair_digits() {
        assert_eq!(repair_digits("1 2O5"), "1205");
        assert_eq!(repair_digits("l,3I|"), "1311");
        assert_eq!(repair_digits("2.000"), "2000");
    }
}
