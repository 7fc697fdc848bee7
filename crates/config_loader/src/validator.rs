//! Configuration validation
//!
//! Rules:
//! - paths.root not empty
//! - device ids unique, hot folder names unique (case-insensitive)
//! - every device accepts at least one extension
//! - triplet devices name three distinct sub-kinds
//! - multi-photo devices need min_members >= 1
//! - fixed-format devices carry at least one pattern
//! - jsonl store has a backing path
//! - canonicalizer ranges (validator derive)

use std::collections::HashSet;

use contracts::{
    AnalyzerConfig, ContractError, GroupingPolicy, IngestBlueprint, StoreBackendKind,
};
use validator::Validate;

/// Validate an IngestBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    validate_paths(blueprint)?;
    validate_store(blueprint)?;
    validate_canonicalizer(blueprint)?;
    validate_device_ids(blueprint)?;
    validate_device_folders(blueprint)?;
    validate_device_policies(blueprint)?;
    Ok(())
}

fn validate_paths(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    if blueprint.paths.root.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "paths.root",
            "root path cannot be empty",
        ));
    }
    if blueprint.paths.incoming == blueprint.paths.processed {
        return Err(ContractError::config_validation(
            "paths.incoming / paths.processed",
            "incoming and processed trees must differ",
        ));
    }
    Ok(())
}

fn validate_store(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    if blueprint.store.backend == StoreBackendKind::Jsonl
        && blueprint.store.path.as_os_str().is_empty()
    {
        return Err(ContractError::config_validation(
            "store.path",
            "jsonl store requires a path",
        ));
    }
    Ok(())
}

fn validate_canonicalizer(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    blueprint
        .canonicalizer
        .validate()
        .map_err(|e| ContractError::config_validation("canonicalizer", e.to_string()))
}

/// Device id uniqueness
fn validate_device_ids(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for device in &blueprint.devices {
        if device.id.is_empty() {
            return Err(ContractError::config_validation(
                "devices[].id",
                "device id cannot be empty",
            ));
        }
        if !seen.insert(device.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("devices[id={}]", device.id),
                "duplicate device id",
            ));
        }
    }
    Ok(())
}

/// Hot folder uniqueness; events are routed by folder name
fn validate_device_folders(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for device in &blueprint.devices {
        if device.folder.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("devices[{}].folder", device.id),
                "folder cannot be empty",
            ));
        }
        if !seen.insert(device.folder.to_lowercase()) {
            return Err(ContractError::config_validation(
                format!("devices[{}].folder", device.id),
                format!("duplicate folder '{}'", device.folder),
            ));
        }
    }
    Ok(())
}

fn validate_device_policies(blueprint: &IngestBlueprint) -> Result<(), ContractError> {
    for device in &blueprint.devices {
        if device.extensions.is_empty() {
            return Err(ContractError::config_validation(
                format!("devices[{}].extensions", device.id),
                "at least one extension is required",
            ));
        }

        match &device.grouping {
            GroupingPolicy::Triplet { sub_kinds } => {
                let distinct: HashSet<_> = sub_kinds
                    .iter()
                    .map(|k| k.trim().to_uppercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                if sub_kinds.len() != 3 || distinct.len() != 3 {
                    return Err(ContractError::config_validation(
                        format!("devices[{}].grouping.sub_kinds", device.id),
                        format!("triplet needs three distinct sub-kinds, got {sub_kinds:?}"),
                    ));
                }
            }
            GroupingPolicy::MultiPhoto { min_members } if *min_members == 0 => {
                return Err(ContractError::config_validation(
                    format!("devices[{}].grouping.min_members", device.id),
                    "min_members must be >= 1",
                ));
            }
            _ => {}
        }

        if let AnalyzerConfig::FixedFormat { patterns } = &device.analyzer {
            if patterns.is_empty() {
                return Err(ContractError::config_validation(
                    format!("devices[{}].analyzer.patterns", device.id),
                    "fixed-format analyzer needs at least one pattern",
                ));
            }
        }
    }
    Ok(())
}
