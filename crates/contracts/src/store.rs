//! RecordStore trait - the external append-only table
//!
//! Defines the abstract interface for the tabular store rows are appended to.

use crate::{ContractError, UploadRow};

/// Append-only tabular store.
///
/// The store is never updated in place. Callers read all rows, compute the set
/// difference and append the remainder.
#[trait_variant::make(RecordStore: Send)]
pub trait LocalRecordStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Read every existing row, header excluded, in store order
    async fn read_rows(&mut self) -> Result<Vec<UploadRow>, ContractError>;

    /// Append rows in one call
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn append_rows(&mut self, rows: &[UploadRow]) -> Result<(), ContractError>;
}
