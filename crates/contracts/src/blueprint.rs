//! IngestBlueprint - Config Loader output
//!
//! Describes the complete ingestion setup: storage roots, record store,
//! recognition engine, canonicalizer tuning, watch cadence and devices.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::{DeviceId, RecognitionHint};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Storage roots
    pub paths: PathsConfig,

    /// External record store
    #[serde(default)]
    pub store: StoreConfig,

    /// Text recognition engine
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Label canonicalization tuning
    #[serde(default)]
    pub canonicalizer: CanonicalizerConfig,

    /// Watch loop cadence
    #[serde(default)]
    pub watch: WatchConfig,

    /// Capture devices, one hot folder each
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
}

impl IngestBlueprint {
    /// Minimal blueprint with default devices under `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            version: ConfigVersion::V1,
            paths: PathsConfig {
                root: root.into(),
                incoming: default_incoming(),
                processed: default_processed(),
            },
            store: StoreConfig::default(),
            recognition: RecognitionConfig::default(),
            canonicalizer: CanonicalizerConfig::default(),
            watch: WatchConfig::default(),
            devices: default_devices(),
        }
    }

    /// Resolve a possibly relative path against `paths.root`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.root.join(path)
        }
    }

    pub fn incoming_root(&self) -> PathBuf {
        self.resolve(&self.paths.incoming)
    }

    pub fn processed_root(&self) -> PathBuf {
        self.resolve(&self.paths.processed)
    }

    /// Hot folder of a device
    pub fn incoming_dir(&self, device: &DeviceConfig) -> PathBuf {
        self.incoming_root().join(&device.folder)
    }

    /// Archive folder of a device
    pub fn processed_dir(&self, device: &DeviceConfig) -> PathBuf {
        self.processed_root().join(&device.folder)
    }

    /// Device named `id` (case-insensitive)
    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id.matches(id))
    }

    /// Device whose hot folder is named `folder` (case-insensitive)
    pub fn device_for_folder(&self, folder: &str) -> Option<&DeviceConfig> {
        self.devices
            .iter()
            .find(|d| d.folder.eq_ignore_ascii_case(folder))
    }
}

/// Storage roots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory; relative paths elsewhere resolve against it
    pub root: PathBuf,

    /// Incoming tree holding the hot folders
    #[serde(default = "default_incoming")]
    pub incoming: PathBuf,

    /// Processed tree receiving archived captures
    #[serde(default = "default_processed")]
    pub processed: PathBuf,
}

fn default_incoming() -> PathBuf {
    PathBuf::from("incoming")
}

fn default_processed() -> PathBuf {
    PathBuf::from("processed")
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StoreBackendKind,

    /// Backing file (jsonl backend)
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Location of the store credentials; never read by the pipeline itself
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Table / worksheet name
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::default(),
            path: default_store_path(),
            credentials_file: None,
            table: default_table(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("captures.jsonl")
}

fn default_table() -> String {
    "CAPTURAS".to_string()
}

/// Record store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendKind {
    /// Append-only JSON-lines file
    #[default]
    Jsonl,
    /// Log rows only (dry run)
    Log,
    /// In-process table (tests)
    Memory,
}

/// Text recognition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub engine: RecognitionEngine,

    /// Engine executable
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Engine language spec
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            engine: RecognitionEngine::default(),
            binary: default_binary(),
            language: default_language(),
        }
    }
}

fn default_binary() -> String {
    "tesseract".to_string()
}

fn default_language() -> String {
    "spa+eng".to_string()
}

/// Recognition engine kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionEngine {
    /// Tesseract command line
    #[default]
    Tesseract,
    /// Pre-recognized `<image>.txt` files next to each capture
    Sidecar,
}

/// Label canonicalization tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CanonicalizerConfig {
    /// Minimum similarity (0-100) for a fuzzy match
    #[serde(default = "default_similarity_threshold")]
    #[validate(range(min = 1.0, max = 100.0))]
    pub similarity_threshold: f64,

    /// Maximum label lines collected after a value anchor
    #[serde(default = "default_label_window")]
    #[validate(range(min = 1, max = 10))]
    pub label_window: usize,

    /// Tokens discarded during label normalization
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,

    /// Canonical names tried first when candidates tie
    #[serde(default)]
    pub priority: Vec<String>,
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            label_window: default_label_window(),
            stop_words: default_stop_words(),
            priority: Vec::new(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    80.0
}

fn default_label_window() -> usize {
    2
}

fn default_stop_words() -> Vec<String> {
    [
        "medida", "perfil", "grafico", "gráfico", "x", "t", "&", "ba", "o", "a", "h", "=", ":",
        ";",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Watch loop cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Polling interval of the incoming tree
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Periodic full rescan (0 = startup only)
    #[serde(default)]
    pub rescan_interval_secs: u64,

    /// Event channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            rescan_interval_secs: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_channel_capacity() -> usize {
    256
}

/// Capture device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique identifier
    pub id: DeviceId,

    /// Hot folder name under both incoming and processed roots
    pub folder: String,

    /// Accepted extensions, without dot
    pub extensions: Vec<String>,

    /// How files are grouped into capture sets
    pub grouping: GroupingPolicy,

    /// How a ready capture set becomes metrics
    pub analyzer: AnalyzerConfig,

    /// Page segmentation hint for image devices
    #[serde(default = "default_page_segmentation")]
    pub page_segmentation: u8,
}

impl DeviceConfig {
    /// Whether `extension` (any case, no dot) is accepted
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    pub fn recognition_hint(&self, recognition: &RecognitionConfig) -> RecognitionHint {
        RecognitionHint {
            language: recognition.language.clone(),
            page_segmentation: self.page_segmentation,
        }
    }
}

fn default_page_segmentation() -> u8 {
    3
}

/// Capture-set completeness policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// Exactly one file of each sub-kind sharing a date+time stamp
    Triplet {
        #[serde(default = "default_sub_kinds")]
        sub_kinds: Vec<String>,
    },
    /// At least `min_members` images sharing a date token
    MultiPhoto {
        #[serde(default = "default_min_members")]
        min_members: usize,
    },
    /// Every file is its own capture set
    Single,
}

fn default_sub_kinds() -> Vec<String> {
    vec!["RR".to_string(), "ACC".to_string(), "HR".to_string()]
}

fn default_min_members() -> usize {
    2
}

/// Analyzer selection per device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyzerConfig {
    /// Value-then-label dashboards resolved through a label dictionary
    TokenStream {
        #[serde(default)]
        dictionary: Option<PathBuf>,
    },
    /// Fixed label words next to digit runs
    FixedFormat {
        #[serde(default = "default_fixed_patterns")]
        patterns: Vec<FixedPattern>,
    },
    /// Heart-rate-variability analysis of RR/ACC/HR exports
    PolarHrv {
        #[serde(default = "default_rest_threshold")]
        rest_threshold: f64,
    },
}

impl AnalyzerConfig {
    /// Whether captures must go through text recognition first
    pub fn needs_recognition(&self) -> bool {
        !matches!(self, Self::PolarHrv { .. })
    }
}

/// Label word and the metric key it yields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPattern {
    pub label: String,
    pub metric: String,
}

impl FixedPattern {
    pub fn new(label: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            metric: metric.into(),
        }
    }
}

fn default_fixed_patterns() -> Vec<FixedPattern> {
    vec![
        FixedPattern::new("Comido", "AMAZFIT_KCAL_COMIDO"),
        FixedPattern::new("Ejercicio", "AMAZFIT_KCAL_EJERCICIO"),
        FixedPattern::new("Restante", "AMAZFIT_KCAL_RESTANTE"),
        FixedPattern::new("Meta", "AMAZFIT_KCAL_META"),
    ]
}

fn default_rest_threshold() -> f64 {
    20.0
}

fn image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect()
}

/// The four hot folders shipped by default
pub fn default_devices() -> Vec<DeviceConfig> {
    let mut lab_extensions = image_extensions();
    lab_extensions.push("pdf".to_string());

    vec![
        DeviceConfig {
            id: "polar".into(),
            folder: "Polar".to_string(),
            extensions: vec!["txt".to_string()],
            grouping: GroupingPolicy::Triplet {
                sub_kinds: default_sub_kinds(),
            },
            analyzer: AnalyzerConfig::PolarHrv {
                rest_threshold: default_rest_threshold(),
            },
            page_segmentation: default_page_segmentation(),
        },
        DeviceConfig {
            id: "starfit".into(),
            folder: "starfit".to_string(),
            extensions: image_extensions(),
            grouping: GroupingPolicy::MultiPhoto {
                min_members: default_min_members(),
            },
            analyzer: AnalyzerConfig::TokenStream {
                dictionary: Some(PathBuf::from("dictionaries/starfit.json")),
            },
            page_segmentation: 3,
        },
        DeviceConfig {
            id: "amazfit".into(),
            folder: "amazfit".to_string(),
            extensions: image_extensions(),
            grouping: GroupingPolicy::Single,
            analyzer: AnalyzerConfig::FixedFormat {
                patterns: default_fixed_patterns(),
            },
            page_segmentation: 6,
        },
        DeviceConfig {
            id: "laboratorio".into(),
            folder: "laboratorio".to_string(),
            extensions: lab_extensions,
            grouping: GroupingPolicy::Single,
            analyzer: AnalyzerConfig::TokenStream {
                dictionary: Some(PathBuf::from("dictionaries/laboratorio.json")),
            },
            page_segmentation: 3,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_devices_cover_hot_folders() {
        let bp = IngestBlueprint::with_root("/data");
        assert_eq!(bp.devices.len(), 4);
        assert_eq!(bp.device_for_folder("POLAR").unwrap().id, "polar");
        assert!(bp.device("amazfit").unwrap().accepts_extension("JPG"));
        assert!(!bp.device("polar").unwrap().accepts_extension("jpg"));
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let bp = IngestBlueprint::with_root("/data");
        let starfit = bp.device("starfit").unwrap();
        assert_eq!(bp.incoming_dir(starfit), PathBuf::from("/data/incoming/starfit"));
        assert_eq!(bp.processed_dir(starfit), PathBuf::from("/data/processed/starfit"));
        assert_eq!(bp.resolve(Path::new("/abs/x")), PathBuf::from("/abs/x"));
    }

    #[test]
    fn test_grouping_policy_serde_tagged() {
        let json = r#"{"kind":"multi_photo"}"#;
        let policy: GroupingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy, GroupingPolicy::MultiPhoto { min_members: 2 });
    }

    #[test]
    fn test_canonicalizer_config_validates_threshold() {
        let mut config = CanonicalizerConfig::default();
        assert!(config.validate().is_ok());
        config.similarity_threshold = 150.0;
        assert!(config.validate().is_err());
    }
}
