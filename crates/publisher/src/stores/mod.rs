//! Record store implementations
//!
//! Contains JsonlStore, LogStore, MemoryStore and the configured backend enum.

mod jsonl;
mod log;
mod memory;

use contracts::{ContractError, IngestBlueprint, RecordStore, StoreBackendKind, UploadRow};
use tracing::info;

pub use self::jsonl::JsonlStore;
pub use self::log::LogStore;
pub use self::memory::MemoryStore;

/// Store chosen at startup
pub enum StoreBackend {
    Jsonl(JsonlStore),
    Log(LogStore),
    Memory(MemoryStore),
}

impl StoreBackend {
    /// Build the `[store]` backend; relative paths resolve against the root
    pub fn from_blueprint(blueprint: &IngestBlueprint) -> Self {
        let config = &blueprint.store;
        let backend = match config.backend {
            StoreBackendKind::Jsonl => {
                Self::Jsonl(JsonlStore::new(&config.table, blueprint.resolve(&config.path)))
            }
            StoreBackendKind::Log => Self::Log(LogStore::new(&config.table)),
            StoreBackendKind::Memory => Self::Memory(MemoryStore::new(&config.table)),
        };
        info!(store = backend.name(), kind = ?config.backend, "record store configured");
        backend
    }
}

impl From<MemoryStore> for StoreBackend {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl RecordStore for StoreBackend {
    fn name(&self) -> &str {
        match self {
            Self::Jsonl(s) => s.name(),
            Self::Log(s) => s.name(),
            Self::Memory(s) => s.name(),
        }
    }

    async fn read_rows(&mut self) -> Result<Vec<UploadRow>, ContractError> {
        match self {
            Self::Jsonl(s) => s.read_rows().await,
            Self::Log(s) => s.read_rows().await,
            Self::Memory(s) => s.read_rows().await,
        }
    }

    async fn append_rows(&mut self, rows: &[UploadRow]) -> Result<(), ContractError> {
        match self {
            Self::Jsonl(s) => s.append_rows(rows).await,
            Self::Log(s) => s.append_rows(rows).await,
            Self::Memory(s) => s.append_rows(rows).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_path_resolves_against_root() {
        let blueprint = IngestBlueprint::with_root("/data/health");
        let StoreBackend::Jsonl(store) = StoreBackend::from_blueprint(&blueprint) else {
            panic!("jsonl is the default backend");
        };
        assert_eq!(store.path(), std::path::Path::new("/data/health/captures.jsonl"));
        assert_eq!(store.name(), "CAPTURAS");
    }
}
