//! TokenStreamExtractor - dashboards printed as a value line followed by
//! one or more label lines.
//!
//! ```text
//! 81.9        <- anchor (value, optional unit)
//! Peso        <- label window
//! 22.9%
//! Grasa Corporal
//! ```

use std::sync::LazyLock;

use contracts::{CanonicalMetric, RawReading};
use regex::Regex;
use tracing::debug;

use crate::canonicalizer::LabelCanonicalizer;
use crate::normalize::strip_diacritics;
use crate::value_rules::{ValueNormalizer, ValueRejected};

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:[.,]\d+)?)(?:\s*(kg|%|kcal))?").expect("anchor pattern")
});

/// Label lines shorter than this are skipped inside the window
const MIN_LABEL_LINE_CHARS: usize = 3;

/// Outcome of one cursor step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Line is not a value anchor
    NotAnchor,
    /// Anchor with a single digit; recognition noise
    Noise,
    /// Anchor whose label window resolved to nothing
    Unlabeled(RawReading),
    /// Value refused by the normalizer
    Rejected(ValueRejected),
    Emitted(CanonicalMetric),
}

/// Recognized text split into trimmed, accent-free, non-empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| strip_diacritics(l).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn has_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

/// Explicit cursor over the line sequence.
pub struct TokenCursor<'a> {
    lines: &'a [String],
    position: usize,
    window: usize,
    canonicalizer: &'a LabelCanonicalizer,
    values: &'a ValueNormalizer,
}

impl<'a> TokenCursor<'a> {
    pub fn new(
        lines: &'a [String],
        window: usize,
        canonicalizer: &'a LabelCanonicalizer,
        values: &'a ValueNormalizer,
    ) -> Self {
        Self {
            lines,
            position: 0,
            window: window.max(1),
            canonicalizer,
            values,
        }
    }

    /// Index of the next line to inspect
    pub fn position(&self) -> usize {
        self.position
    }

    /// Inspect the line at the cursor and advance. `None` once exhausted.
    ///
    /// The cursor always moves forward, past any label lines it consumed.
    pub fn step(&mut self) -> Option<Step> {
        let line = self.lines.get(self.position)?;

        let Some(caps) = ANCHOR.captures(line) else {
            self.position += 1;
            return Some(Step::NotAnchor);
        };
        let number = caps[1].to_string();
        let unit = caps.get(2).map(|m| m.as_str().to_lowercase());

        if number.chars().filter(|c| c.is_ascii_digit()).count() == 1 {
            self.position += 1;
            return Some(Step::Noise);
        }

        let (label, next) = self.label_window(self.position + 1);
        self.position = next;
        Some(self.resolve(RawReading {
            label,
            number,
            unit,
        }))
    }

    /// Canonicalize the label, then parse and normalize the value
    fn resolve(&self, reading: RawReading) -> Step {
        let Some(resolved) = self.canonicalizer.canonicalize(&reading.label) else {
            return Step::Unlabeled(reading);
        };
        let Ok(raw_value) = reading.number.replace(',', ".").parse::<f64>() else {
            return Step::Unlabeled(reading);
        };

        let value = match self.values.normalize(&resolved.name, raw_value) {
            Ok(v) => v,
            Err(rejected) => return Step::Rejected(rejected),
        };

        let mut metric = CanonicalMetric::new(resolved.name, value);
        if let Some(unit) = reading.unit {
            metric = metric.with_unit(unit);
        }
        Step::Emitted(metric)
    }

    /// Collect up to `window` label lines from `start`, stopping at the first
    /// line holding a digit. Returns the joined label and the index after the
    /// consumed lines.
    fn label_window(&self, start: usize) -> (String, usize) {
        let mut parts: Vec<&str> = Vec::with_capacity(self.window);
        let mut j = start;
        while let Some(line) = self.lines.get(j) {
            if has_digit(line) {
                break;
            }
            j += 1;
            if line.chars().count() >= MIN_LABEL_LINE_CHARS {
                parts.push(line);
                if parts.len() == self.window {
                    break;
                }
            }
        }
        (parts.join(" ").trim().to_string(), j)
    }
}

impl Iterator for TokenCursor<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        self.step()
    }
}

/// Value-then-label extractor
#[derive(Debug, Clone)]
pub struct TokenStreamExtractor {
    canonicalizer: LabelCanonicalizer,
    values: ValueNormalizer,
    window: usize,
}

impl TokenStreamExtractor {
    pub fn new(canonicalizer: LabelCanonicalizer, values: ValueNormalizer, window: usize) -> Self {
        Self {
            canonicalizer,
            values,
            window,
        }
    }

    /// Metrics in order of appearance. Duplicates are kept; callers dedup.
    pub fn extract(&self, text: &str) -> Vec<CanonicalMetric> {
        let lines = split_lines(text);
        let mut metrics = Vec::new();
        for step in TokenCursor::new(&lines, self.window, &self.canonicalizer, &self.values) {
            match step {
                Step::Emitted(metric) => metrics.push(metric),
                Step::Rejected(rejected) => debug!(%rejected, "value dropped"),
                Step::Unlabeled(reading) => {
                    debug!(number = %reading.number, label = %reading.label, "reading without label")
                }
                Step::NotAnchor | Step::Noise => {}
            }
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::LabelDictionary;
    use contracts::CanonicalizerConfig;

    fn extractor() -> TokenStreamExtractor {
        let dictionary = LabelDictionary::from_entries([
            ("Peso (kg)", vec!["peso"]),
            ("Grasa Corporal (%)", vec!["grasa corporal"]),
            ("IMC", vec!["imc"]),
        ]);
        let canonicalizer =
            LabelCanonicalizer::from_config(dictionary, &CanonicalizerConfig::default());
        TokenStreamExtractor::new(canonicalizer, ValueNormalizer::default(), 2)
    }

    fn pairs(metrics: &[CanonicalMetric]) -> Vec<(String, f64)> {
        metrics.iter().map(|m| (m.display_name(), m.value)).collect()
    }

    #[test]
    fn test_dashboard_scenario() {
        let text = "\n81.9\nPeso\n22.9%\nGrasa Corporal\n26.1\nIMC\n";
        let metrics = extractor().extract(text);
        assert_eq!(
            pairs(&metrics),
            vec![
                ("Peso (kg)".to_string(), 81.9),
                ("Grasa Corporal (%)".to_string(), 22.9),
                ("IMC".to_string(), 26.1),
            ]
        );
    }

    #[test]
    fn test_imc_out_of_range_dropped() {
        let metrics = extractor().extract("3.0\nIMC\n81.9\nPeso");
        assert_eq!(pairs(&metrics), vec![("Peso (kg)".to_string(), 81.9)]);
    }

    #[test]
    fn test_single_digit_is_noise() {
        let lines = split_lines("7\nPeso\n");
        let e = extractor();
        let mut cursor = TokenCursor::new(&lines, 2, &e.canonicalizer, &e.values);
        assert_eq!(cursor.step(), Some(Step::Noise));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.step(), Some(Step::NotAnchor));
        assert_eq!(cursor.step(), None);
    }

    #[test]
    fn test_cursor_skips_consumed_label_lines() {
        let lines = split_lines("45,3 kg\nMasa\nMuscular\nTotal\n12.0\nx");
        let e = extractor();
        let mut cursor = TokenCursor::new(&lines, 2, &e.canonicalizer, &e.values);
        let step = cursor.step().unwrap();
        assert_eq!(
            step,
            Step::Emitted(CanonicalMetric::new("Masa Muscular", 45.3).with_unit("kg"))
        );
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.step(), Some(Step::NotAnchor));
        // "12.0" followed only by a short line: no label
        assert_eq!(
            cursor.step(),
            Some(Step::Unlabeled(RawReading {
                label: String::new(),
                number: "12.0".into(),
                unit: None,
            }))
        );
        assert_eq!(cursor.step(), None);
    }

    #[test]
    fn test_unlabeled_reading_keeps_raw_tokens() {
        let lines = split_lines("70,2 KG\n55\n");
        let e = extractor();
        let mut cursor = TokenCursor::new(&lines, 2, &e.canonicalizer, &e.values);
        assert_eq!(
            cursor.step(),
            Some(Step::Unlabeled(RawReading {
                label: String::new(),
                number: "70,2".into(),
                unit: Some("kg".into()),
            }))
        );
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_window_stops_at_digit_line() {
        let metrics = extractor().extract("64.2 kg\nAgua\n55%\nGrasa Corporal");
        assert_eq!(metrics[0].name, "Agua");
        assert_eq!(metrics[0].display_name(), "Agua (kg)");
        assert_eq!(metrics[1].name, "Grasa Corporal (%)");
        assert_eq!(metrics[1].value, 55.0);
    }

    #[test]
    fn test_unit_not_duplicated() {
        let metrics = extractor().extract("80,5kg\nPeso");
        assert_eq!(metrics[0].display_name(), "Peso (kg)");
        assert_eq!(metrics[0].value, 80.5);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let metrics = extractor().extract("81.9\nPeso\n82.0\nPeso");
        assert_eq!(metrics.len(), 2);
    }
}
