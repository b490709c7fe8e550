use crate::traits::Publisher;
use crate::types::{PostRecord, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const JSON_FILE: &str = "posts.json";

/// Dumps the sorted post records for renderers living outside this process.
pub struct JsonPublisher;

impl Publisher for JsonPublisher {
    fn name(&self) -> &str {
        "json"
    }

    fn publish(&self, posts: &[PostRecord], output_dir: &Path) -> Result<()> {
        let path = output_dir.join(JSON_FILE);
        fs::write(&path, serde_json::to_vec_pretty(posts)?)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
