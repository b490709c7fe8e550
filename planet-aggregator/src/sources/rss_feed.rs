use crate::traits::FetchEntries;
use crate::types::{FetchConfig, RawEntry, Result, SourceSpec};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Fetch collaborator that retrieves feeds over HTTP and parses them with feed-rs.
pub struct HttpFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl HttpFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
            parser: FeedParser::new(),
        })
    }

    async fn try_fetch(&self, source: &SourceSpec) -> Result<Vec<RawEntry>> {
        let fetch_result = self.fetcher.fetch_feed(&source.link).await?;

        if !fetch_result.success {
            let error_msg = fetch_result.error.unwrap_or_else(|| "Fetch failed".to_string());
            error!(
                "Failed to fetch feed {} (status {:?}, {} ms): {}",
                fetch_result.url, fetch_result.http_status, fetch_result.response_time_ms, error_msg
            );
            return Ok(Vec::new());
        }

        debug!(
            "Feed {} answered {:?} in {} ms",
            fetch_result.url, fetch_result.http_status, fetch_result.response_time_ms
        );

        let content = match fetch_result.content {
            Some(content) => content,
            None => {
                warn!("No content returned for feed {}", source.link);
                return Ok(Vec::new());
            }
        };

        self.parser.parse_feed(&content, &source.link)
    }
}

#[async_trait]
impl FetchEntries for HttpFeedSource {
    async fn fetch(&self, source: &SourceSpec) -> Vec<RawEntry> {
        info!("Pulling feed: {}", source.link);

        match self.try_fetch(source).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Dropping source {}: {}", source.link, e);
                Vec::new()
            }
        }
    }
}
