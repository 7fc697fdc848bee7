//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{AnalyzerConfig, IngestBlueprint, StoreBackendKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    root: String,
    incoming: String,
    processed: String,
    store_backend: String,
    recognition_engine: String,
    device_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    root: blueprint.paths.root.display().to_string(),
                    incoming: blueprint.incoming_root().display().to_string(),
                    processed: blueprint.processed_root().display().to_string(),
                    store_backend: format!("{:?}", blueprint.store.backend),
                    recognition_engine: format!("{:?}", blueprint.recognition.engine),
                    device_count: blueprint.devices.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &IngestBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.store.backend == StoreBackendKind::Memory {
        warnings.push("store.backend is 'memory' - rows are lost on exit".to_string());
    }

    if let Some(ref credentials) = blueprint.store.credentials_file {
        let path = blueprint.resolve(credentials);
        if !path.exists() {
            warnings.push(format!("Credentials file not found: {}", path.display()));
        }
    }

    for device in &blueprint.devices {
        if let AnalyzerConfig::TokenStream {
            dictionary: Some(ref dictionary),
        } = device.analyzer
        {
            let path = blueprint.resolve(dictionary);
            if !path.exists() {
                warnings.push(format!(
                    "Device '{}' dictionary not found: {} - labels will not resolve",
                    device.id,
                    path.display()
                ));
            }
        }

        let incoming = blueprint.incoming_dir(device);
        if !incoming.is_dir() {
            warnings.push(format!(
                "Device '{}' hot folder does not exist yet: {}",
                device.id,
                incoming.display()
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Root: {}", summary.root);
            println!("  Incoming: {}", summary.incoming);
            println!("  Processed: {}", summary.processed);
            println!("  Store: {}", summary.store_backend);
            println!("  Recognition: {}", summary.recognition_engine);
            println!("  Devices: {}", summary.device_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
