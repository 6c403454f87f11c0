//! JSON directory store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use mathdrill_core::report::ExamRecord;
use mathdrill_core::traits::ResultStore;

use crate::error::StoreError;

/// Persists each record as a pretty-printed JSON file in one directory.
///
/// File names start with the record timestamp, so a directory listing is
/// already in chronological order.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, record: &ExamRecord) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            record.created_at.format("%Y%m%dT%H%M%S"),
            record.id
        ))
    }

    async fn write_record(&self, record: &ExamRecord) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.record_path(record);
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    async fn read_record(path: &Path) -> Result<ExamRecord, StoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    async fn read_all(&self) -> Result<Vec<ExamRecord>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::read_record(&path).await {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable record"),
                }
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, record: &ExamRecord) -> anyhow::Result<()> {
        let path = self.write_record(record).await?;
        tracing::info!(path = %path.display(), mark = record.mark, "saved exam record");
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<ExamRecord>> {
        Ok(self.read_all().await?)
    }
}
