//! In-memory store for tests and throwaway sessions.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use mathdrill_core::report::ExamRecord;
use mathdrill_core::traits::ResultStore;

/// Keeps records in insertion order for the life of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ExamRecord>>,
    /// Number of `save` calls made.
    save_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of saves made to this store.
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, record: &ExamRecord) -> anyhow::Result<()> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<ExamRecord>> {
        let mut records = self.records.lock().await.clone();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
