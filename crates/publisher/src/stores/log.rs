//! LogStore - logs rows instead of storing them (dry run)

use contracts::{ContractError, RecordStore, UploadRow};
use tracing::{info, instrument};

/// Rows appended during this process are remembered so repeated captures
/// still dedup within one run.
pub struct LogStore {
    name: String,
    seen: Vec<UploadRow>,
}

impl LogStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Vec::new(),
        }
    }
}

impl RecordStore for LogStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_rows(&mut self) -> Result<Vec<UploadRow>, ContractError> {
        Ok(self.seen.clone())
    }

    #[instrument(name = "log_store_append", skip(self, rows), fields(store = %self.name))]
    async fn append_rows(&mut self, rows: &[UploadRow]) -> Result<(), ContractError> {
        for row in rows {
            info!(
                date = %row.date,
                metric = %row.metric,
                value = %row.value,
                source = %row.source,
                "row"
            );
        }
        self.seen.extend_from_slice(rows);
        Ok(())
    }
}
