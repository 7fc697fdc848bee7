//! Dedup against prior uploads, then append the remainder.

use std::collections::HashSet;

use contracts::{ContractError, RecordStore, UploadRow};
use tracing::{debug, instrument};

/// Outcome of one upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub appended: usize,
    pub duplicates: usize,
}

impl UploadReport {
    /// Every row was already stored
    pub fn only_duplicates(&self) -> bool {
        self.appended == 0
    }
}

/// Rows not present in `existing`, comparing the exact 4-tuple. Repeats
/// within `rows` are kept once. Order is preserved.
pub fn filter_new_rows(existing: &[UploadRow], rows: Vec<UploadRow>) -> Vec<UploadRow> {
    let mut seen: HashSet<&UploadRow> = existing.iter().collect();
    let mut fresh = Vec::with_capacity(rows.len());
    for row in &rows {
        if seen.insert(row) {
            fresh.push(row.clone());
        }
    }
    fresh
}

/// Read the store, drop rows already present, append the rest in one call.
///
/// # Errors
/// Store read or write failure; nothing is appended on a read failure.
#[instrument(name = "upload_new_rows", skip_all, fields(store = store.name(), rows = rows.len()))]
pub async fn upload_new_rows<S>(store: &mut S, rows: Vec<UploadRow>) -> Result<UploadReport, ContractError>
where
    S: RecordStore,
{
    let total = rows.len();
    let existing = store.read_rows().await?;
    let fresh = filter_new_rows(&existing, rows);
    let report = UploadReport {
        appended: fresh.len(),
        duplicates: total - fresh.len(),
    };
    if !fresh.is_empty() {
        store.append_rows(&fresh).await?;
        metrics::counter!("healthsync_rows_uploaded_total").increment(fresh.len() as u64);
    }
    debug!(appended = report.appended, duplicates = report.duplicates, "upload finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    fn row(metric: &str, value: &str) -> UploadRow {
        UploadRow::new("2024-01-01", metric, value, "IMG_20240101_a.jpg")
    }

    #[test]
    fn test_filter_new_rows() {
        let existing = vec![row("IMC", "26.10")];
        let rows = vec![
            row("IMC", "26.10"),
            row("IMC", "26.11"),
            row("Peso (kg)", "81.90"),
            row("Peso (kg)", "81.90"),
        ];
        assert_eq!(
            filter_new_rows(&existing, rows),
            vec![row("IMC", "26.11"), row("Peso (kg)", "81.90")]
        );
    }

    #[tokio::test]
    async fn test_identical_row_uploads_nothing() {
        let mut store = MemoryStore::with_rows("mem", vec![row("IMC", "26.10")]);
        let report = upload_new_rows(&mut store, vec![row("IMC", "26.10")]).await.unwrap();
        assert_eq!(report, UploadReport { appended: 0, duplicates: 1 });
        assert!(report.only_duplicates());
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_appends_nothing() {
        let mut store = MemoryStore::new("mem");
        store.set_fail_reads(true);
        assert!(upload_new_rows(&mut store, vec![row("IMC", "26.10")]).await.is_err());
        assert!(store.rows().is_empty());
    }
}
