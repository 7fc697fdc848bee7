//! # Extraction
//!
//! Turns capture content into canonical metrics.
//!
//! Responsibilities:
//! - Label dictionary loading
//! - Label canonicalization (direct / alias / fallback)
//! - Per-metric value plausibility rules
//! - Text extractors (token stream, fixed format)
//! - HRV analysis of sensor exports
//!
//! ## Usage
//!
//! ```ignore
//! use extraction::CaptureAnalyzer;
//!
//! let analyzer = CaptureAnalyzer::build(device, &blueprint)?;
//! let metrics = analyzer.analyze_text(&recognized)?;
//! ```

pub mod analyzer;
pub mod canonicalizer;
pub mod dictionary;
mod error;
pub mod fixed_format;
pub mod hrv;
pub mod normalize;
pub mod similarity;
pub mod token_stream;
pub mod value_rules;

pub use analyzer::CaptureAnalyzer;
pub use canonicalizer::{Canonicalized, LabelCanonicalizer, MatchKind};
pub use dictionary::LabelDictionary;
pub use error::{ExtractionError, Result};
pub use fixed_format::FixedFormatExtractor;
pub use hrv::{HrvAnalyzer, HrvReport};
pub use normalize::LabelNormalizer;
pub use token_stream::{Step, TokenCursor, TokenStreamExtractor};
pub use value_rules::{MetricMatcher, ValueNormalizer, ValueRejected, ValueRule};
