//! CaptureAnalyzer - per-device strategy turning a ready capture group into
//! metrics.

use contracts::{AnalyzerConfig, CanonicalMetric, CaptureGroup, DeviceConfig, IngestBlueprint};
use tracing::info;

use crate::canonicalizer::LabelCanonicalizer;
use crate::dictionary::LabelDictionary;
use crate::error::{ExtractionError, Result};
use crate::fixed_format::FixedFormatExtractor;
use crate::hrv::HrvAnalyzer;
use crate::token_stream::TokenStreamExtractor;
use crate::value_rules::ValueNormalizer;

/// Analyzer selected by a device's configuration
#[derive(Debug, Clone)]
pub enum CaptureAnalyzer {
    /// Recognized text, value-then-label layout
    TokenStream(TokenStreamExtractor),
    /// Recognized text, fixed label words
    FixedFormat(FixedFormatExtractor),
    /// Raw sensor exports
    PolarHrv(HrvAnalyzer),
}

impl CaptureAnalyzer {
    /// Build the analyzer of `device`. Dictionary paths resolve against the
    /// blueprint root; a dictionary that cannot be loaded degrades to empty.
    ///
    /// # Errors
    /// `ExtractionError::Pattern` for an uncompilable fixed-format label.
    pub fn build(device: &DeviceConfig, blueprint: &IngestBlueprint) -> Result<Self> {
        let analyzer = match &device.analyzer {
            AnalyzerConfig::TokenStream { dictionary } => {
                let dictionary = match dictionary {
                    Some(path) => LabelDictionary::load_or_empty(&blueprint.resolve(path)),
                    None => LabelDictionary::empty(),
                };
                info!(
                    device = %device.id,
                    entries = dictionary.len(),
                    "token-stream analyzer ready"
                );
                let canonicalizer =
                    LabelCanonicalizer::from_config(dictionary, &blueprint.canonicalizer);
                Self::TokenStream(TokenStreamExtractor::new(
                    canonicalizer,
                    ValueNormalizer::default(),
                    blueprint.canonicalizer.label_window,
                ))
            }
            AnalyzerConfig::FixedFormat { patterns } => Self::FixedFormat(
                FixedFormatExtractor::new(patterns, ValueNormalizer::default())?,
            ),
            AnalyzerConfig::PolarHrv { rest_threshold } => {
                Self::PolarHrv(HrvAnalyzer::new(*rest_threshold))
            }
        };
        Ok(analyzer)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenStream(_) => "token_stream",
            Self::FixedFormat(_) => "fixed_format",
            Self::PolarHrv(_) => "polar_hrv",
        }
    }

    /// Whether members go through text recognition before analysis
    pub fn needs_recognition(&self) -> bool {
        !matches!(self, Self::PolarHrv(_))
    }

    /// Metrics from one member's recognized text, in order of appearance
    pub fn analyze_text(&self, text: &str) -> Result<Vec<CanonicalMetric>> {
        match self {
            Self::TokenStream(e) => Ok(e.extract(text)),
            Self::FixedFormat(e) => Ok(e.extract(text)),
            Self::PolarHrv(_) => Err(ExtractionError::UnsupportedInput {
                analyzer: self.kind(),
                input: "recognized text",
            }),
        }
    }

    /// Metrics computed directly from the group's files
    pub fn analyze_files(&self, group: &CaptureGroup) -> Result<Vec<CanonicalMetric>> {
        match self {
            Self::PolarHrv(a) => Ok(a.analyze(group)?.metrics()),
            _ => Err(ExtractionError::UnsupportedInput {
                analyzer: self.kind(),
                input: "raw files",
            }),
        }
    }
}
