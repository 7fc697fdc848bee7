//! Command implementations.

mod extract;
mod info;
mod run;
mod scan;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{IngestBlueprint, StoreBackendKind};
use tracing::info;

use crate::error::CliError;

pub use extract::run_extract;
pub use info::run_info;
pub use run::run_pipeline;
pub use scan::run_scan;
pub use validate::run_validate;

/// Load and validate the configuration at `path`
pub(crate) fn load_blueprint(path: &Path) -> Result<IngestBlueprint> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    info!(
        root = %blueprint.paths.root.display(),
        devices = blueprint.devices.len(),
        store = ?blueprint.store.backend,
        engine = ?blueprint.recognition.engine,
        "Configuration loaded"
    );
    Ok(blueprint)
}

/// Route rows to the log instead of the configured store
pub(crate) fn apply_dry_run(blueprint: &mut IngestBlueprint) {
    if blueprint.store.backend != StoreBackendKind::Log {
        info!(configured = ?blueprint.store.backend, "Dry run - rows will only be logged");
        blueprint.store.backend = StoreBackendKind::Log;
    }
}
