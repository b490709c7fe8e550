use crate::types::{PostRecord, RawEntry, Result, SourceSpec};
use async_trait::async_trait;
use interfaces::empty::EmptySource;
use std::path::Path;

/// Pulls the current entries of one configured source.
#[async_trait]
pub trait FetchEntries: Send + Sync {
    /// Fetch and parse the feed behind `source`.
    ///
    /// Never fails past this boundary: transport or parse problems are
    /// logged by the implementation and reported as an empty list.
    async fn fetch(&self, source: &SourceSpec) -> Vec<RawEntry>;
}

#[async_trait]
impl FetchEntries for EmptySource {
    async fn fetch(&self, source: &SourceSpec) -> Vec<RawEntry> {
        EmptySource::entries(source)
    }
}

/// Consumes the final, sorted post collection once per run.
pub trait Publisher: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Write whatever this publisher produces into `output_dir`.
    fn publish(&self, posts: &[PostRecord], output_dir: &Path) -> Result<()>;
}
