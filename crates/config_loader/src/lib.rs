//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `IngestBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("healthsync.toml")).unwrap();
//! println!("Root: {}", blueprint.paths.root.display());
//! ```

mod parser;
mod validator;

pub use contracts::IngestBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<IngestBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<IngestBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-built blueprint (e.g. after CLI overrides)
    pub fn validate(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize IngestBlueprint to TOML string
    pub fn to_toml(blueprint: &IngestBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize IngestBlueprint to JSON string
    pub fn to_json(blueprint: &IngestBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<IngestBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[paths]
root = "/data/salud"

[store]
backend = "jsonl"
path = "capturas.jsonl"
credentials_file = "creds.json"

[canonicalizer]
similarity_threshold = 85.0
priority = ["Peso (kg)"]
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.canonicalizer.similarity_threshold, 85.0);
        assert_eq!(bp.canonicalizer.priority, vec!["Peso (kg)".to_string()]);
        assert!(bp.store.credentials_file.is_some());
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.paths.root, bp2.paths.root);
        assert_eq!(bp.devices.len(), bp2.devices.len());
        assert_eq!(bp.devices[0].grouping, bp2.devices[0].grouping);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.devices[3].analyzer, bp2.devices[3].analyzer);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[paths]
root = "/data"

[[devices]]
id = "a"
folder = "fotos"
extensions = ["jpg"]
grouping = { kind = "single" }
analyzer = { kind = "token_stream" }

[[devices]]
id = "a"
folder = "otras"
extensions = ["jpg"]
grouping = { kind = "single" }
analyzer = { kind = "token_stream" }
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path_rejects_unknown_extension() {
        let result = ConfigLoader::load_from_path(Path::new("config.yaml"));
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }
}
