//! NumericValueNormalizer - per-metric plausibility fixes for recognized
//! numbers.
//!
//! Recognition drops decimal points and merges adjacent glyphs, so a few
//! metrics get corrective rules keyed on their canonical name. Rules run in
//! registration order; the survivor is rounded to two decimals.

use thiserror::Error;

/// Which metric names a rule applies to
#[derive(Debug, Clone, PartialEq)]
pub enum MetricMatcher {
    Exact(String),
    StartsWith(String),
    Contains(String),
}

impl MetricMatcher {
    pub fn matches(&self, metric: &str) -> bool {
        match self {
            Self::Exact(s) => metric == s,
            Self::StartsWith(s) => metric.starts_with(s.as_str()),
            Self::Contains(s) => metric.contains(s.as_str()),
        }
    }
}

/// Value adjustment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRule {
    /// Values >= `at_least` collapse to the first digit of their integer part
    FirstDigit { at_least: f64 },
    /// Divide by 10 while above `ceiling`
    ScaleDownPercent { ceiling: f64 },
    /// Values above `above` are floor-divided by `divisor`
    IntegerDivide { above: f64, divisor: f64 },
    /// Reject values outside `[min, max]`
    Range { min: f64, max: f64 },
}

/// A value that cannot be stored for its metric
#[derive(Debug, Clone, PartialEq, Error)]
#[error("value {value} rejected for '{metric}': {reason}")]
pub struct ValueRejected {
    pub metric: String,
    pub value: f64,
    pub reason: &'static str,
}

impl ValueRule {
    fn apply(&self, metric: &str, value: f64) -> Result<f64, ValueRejected> {
        match *self {
            Self::FirstDigit { at_least } if value >= at_least => {
                let mut n = value.trunc() as u64;
                while n >= 10 {
                    n /= 10;
                }
                Ok(n as f64)
            }
            Self::ScaleDownPercent { ceiling } => {
                let mut v = value;
                while v > ceiling {
                    v /= 10.0;
                }
                Ok(v)
            }
            Self::IntegerDivide { above, divisor } if value > above => {
                Ok((value / divisor).floor())
            }
            Self::Range { min, max } if !(min..=max).contains(&value) => Err(ValueRejected {
                metric: metric.to_string(),
                value,
                reason: "out of range",
            }),
            _ => Ok(value),
        }
    }
}

/// Ordered table of (matcher, rule) entries
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    rules: Vec<(MetricMatcher, ValueRule)>,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self::new()
            .register(
                MetricMatcher::StartsWith("Grasa Visceral".into()),
                ValueRule::FirstDigit { at_least: 10.0 },
            )
            .register(
                MetricMatcher::Contains("%".into()),
                ValueRule::ScaleDownPercent { ceiling: 100.0 },
            )
            .register(
                MetricMatcher::StartsWith("Edad Corporal".into()),
                ValueRule::IntegerDivide {
                    above: 120.0,
                    divisor: 10.0,
                },
            )
            .register(
                MetricMatcher::Exact("IMC".into()),
                ValueRule::Range {
                    min: 5.0,
                    max: 60.0,
                },
            )
    }
}

impl ValueNormalizer {
    /// Normalizer with no rules (rounding and finiteness check only)
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; it runs after every rule already registered
    pub fn register(mut self, matcher: MetricMatcher, rule: ValueRule) -> Self {
        self.rules.push((matcher, rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the matching rules to `value` for canonical name `metric`.
    pub fn normalize(&self, metric: &str, value: f64) -> Result<f64, ValueRejected> {
        if !value.is_finite() {
            return Err(ValueRejected {
                metric: metric.to_string(),
                value,
                reason: "not finite",
            });
        }

        let mut v = value;
        for (matcher, rule) in &self.rules {
            if matcher.matches(metric) {
                v = rule.apply(metric, v)?;
            }
        }
        Ok(round2(v))
    }
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
