use crate::config::PlanetConfig;
use crate::normalizer::{normalize_from_source, NormalizeSettings};
use crate::traits::{FetchEntries, Publisher};
use crate::types::{AggregatorError, PostRecord, Result, SourceSpec};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Drives one full, stateless aggregation run.
pub struct PlanetAggregator {
    settings: NormalizeSettings,
    output_dir: PathBuf,
    max_posts: Option<usize>,
}

impl PlanetAggregator {
    pub fn new(settings: NormalizeSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            max_posts: None,
        }
    }

    pub fn from_config(config: &PlanetConfig) -> Result<Self> {
        Ok(Self::new(config.normalize_settings()?, config.output_dir())
            .with_max_posts(config.planet.max_posts))
    }

    pub fn with_max_posts(mut self, max_posts: Option<usize>) -> Self {
        self.max_posts = max_posts;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch and normalize every source, one after the other, then order newest first.
    ///
    /// A source is completely fetched and normalized before the next one is
    /// touched. Sources that yield nothing simply contribute nothing.
    pub async fn aggregate(&self, sources: &[SourceSpec], fetch: &dyn FetchEntries) -> Vec<PostRecord> {
        let mut posts = Vec::new();

        info!("Aggregating {} sources", sources.len());

        for source in sources {
            let entries = fetch.fetch(source).await;

            if entries.is_empty() {
                warn!("Source {} contributed no entries", source.link);
                continue;
            }

            let before = posts.len();
            posts.extend(
                entries
                    .iter()
                    .map(|entry| normalize_from_source(entry, source, &self.settings)),
            );

            info!("Source {}: normalized {} posts", source.link, posts.len() - before);
        }

        sort_newest_first(&mut posts);

        if let Some(max_posts) = self.max_posts {
            posts.truncate(max_posts);
        }

        info!("Aggregated {} posts", posts.len());
        posts
    }

    /// Make sure the output directory exists. Failing here ends the run.
    pub fn ensure_output_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.output_dir).map_err(|source| {
            error!("Establishing output directory {}", self.output_dir.display());
            AggregatorError::OutputDir {
                path: self.output_dir.clone(),
                source,
            }
        })?;
        Ok(&self.output_dir)
    }

    /// Aggregate, establish the output directory, then hand the posts to every publisher.
    ///
    /// Returns the number of posts published. Only the output directory is
    /// fatal, a failing publisher is logged and the others still run.
    pub async fn run(
        &self,
        sources: &[SourceSpec],
        fetch: &dyn FetchEntries,
        publishers: &[Box<dyn Publisher>],
    ) -> Result<usize> {
        let posts = self.aggregate(sources, fetch).await;
        let output_dir = self.ensure_output_dir()?;

        for publisher in publishers {
            match publisher.publish(&posts, output_dir) {
                Ok(()) => info!("Publisher {} wrote {} posts", publisher.name(), posts.len()),
                Err(e) => error!("Publisher {} failed: {}", publisher.name(), e),
            }
        }

        Ok(posts.len())
    }
}

/// Stable sort, newest sort key first. Equal keys keep their source order.
pub fn sort_newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}
