//! JsonlStore - append-only JSON-lines table
//!
//! One `["date","metric","value","source"]` array per line, no header.

use std::path::{Path, PathBuf};

use contracts::{ContractError, RecordStore, UploadRow};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::error::PublisherError;

pub struct JsonlStore {
    name: String,
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Vec<UploadRow>, PublisherError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<[String; 4]>(line)
                    .map(UploadRow::from_record)
                    .map_err(|e| PublisherError::CorruptRecord {
                        store: self.name.clone(),
                        line: idx + 1,
                        message: e.to_string(),
                    })
            })
            .collect()
    }

    fn render(&self, rows: &[UploadRow]) -> Result<String, ContractError> {
        let mut out = String::new();
        for row in rows {
            let line = serde_json::to_string(&row.to_record())
                .map_err(|e| ContractError::store_write(&self.name, e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

impl RecordStore for JsonlStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "jsonl_store_read", skip(self), fields(store = %self.name))]
    async fn read_rows(&mut self) -> Result<Vec<UploadRow>, ContractError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContractError::store_read(&self.name, e.to_string())),
        };
        let rows = self.parse(&content)?;
        debug!(rows = rows.len(), "existing rows read");
        Ok(rows)
    }

    #[instrument(name = "jsonl_store_append", skip(self, rows), fields(store = %self.name, rows = rows.len()))]
    async fn append_rows(&mut self, rows: &[UploadRow]) -> Result<(), ContractError> {
        if rows.is_empty() {
            return Ok(());
        }
        let write_err = |e: std::io::Error| ContractError::store_write(&self.name, e.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let payload = self.render(rows)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        file.write_all(payload.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        Ok(())
    }
}
