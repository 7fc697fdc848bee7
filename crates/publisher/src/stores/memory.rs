//! MemoryStore - in-process table with injectable failures

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{ContractError, RecordStore, UploadRow};

#[derive(Debug, Default)]
struct Shared {
    rows: Mutex<Vec<UploadRow>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

/// Cloning yields another handle on the same table
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::default(),
        }
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<UploadRow>) -> Self {
        let store = Self::new(name);
        *store.lock() = rows;
        store
    }

    /// Copy of every stored row
    pub fn rows(&self) -> Vec<UploadRow> {
        self.lock().clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.shared.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<UploadRow>> {
        self.shared.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_rows(&mut self) -> Result<Vec<UploadRow>, ContractError> {
        if self.shared.fail_reads.load(Ordering::SeqCst) {
            return Err(ContractError::store_read(&self.name, "injected read failure"));
        }
        Ok(self.rows())
    }

    async fn append_rows(&mut self, rows: &[UploadRow]) -> Result<(), ContractError> {
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(ContractError::store_write(&self.name, "injected write failure"));
        }
        self.lock().extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_rows() {
        let store = MemoryStore::new("mem");
        let mut handle = store.clone();
        handle
            .append_rows(&[UploadRow::new("2024-01-01", "IMC", "26.10", "a.jpg")])
            .await
            .unwrap();
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let mut store = MemoryStore::new("mem");
        store.set_fail_writes(true);
        assert!(store.append_rows(&[]).await.is_err());
        store.set_fail_reads(true);
        assert!(matches!(
            store.read_rows().await,
            Err(ContractError::StoreRead { .. })
        ));
    }
}
