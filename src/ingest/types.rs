// src/ingest/types.rs
use anyhow::Result;

use crate::quake::QuakeRecord;

/// A scraped batch source. Returns records in source order (newest first for
/// PHIVOLCS); a parse failure of the whole page is a single error.
#[async_trait::async_trait]
pub trait QuakeSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<QuakeRecord>>;
    fn name(&self) -> &'static str;
}
