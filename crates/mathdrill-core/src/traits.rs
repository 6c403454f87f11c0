//! Persistence capability trait.
//!
//! Scoring never persists anything itself. Whatever needs to store a
//! finished exam is handed a `ResultStore` explicitly; implementations live
//! in the `mathdrill-store` crate.

use async_trait::async_trait;

use crate::report::ExamRecord;

/// Destination for completed exam records.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Human-readable store name (e.g. "file").
    fn name(&self) -> &str;

    /// Persist one record.
    async fn save(&self, record: &ExamRecord) -> anyhow::Result<()>;

    /// All stored records, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<ExamRecord>>;
}
