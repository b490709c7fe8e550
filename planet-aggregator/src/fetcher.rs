use crate::types::{AggregatorError, FetchConfig, FetchResult, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

const BYTES_PER_MB: usize = 1024 * 1024;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Retrieve the document at `url`, retrying transient failures with backoff.
    ///
    /// Failures are reported through `FetchResult::success`, only an unusable
    /// url is returned as an error.
    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        let start_time = Instant::now();

        debug!("Fetching feed: {}", url);

        // Apply rate limiting
        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds.saturating_mul(32)),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds.saturating_mul(60))),
            ..Default::default()
        };

        let mut last_error = None;
        let mut last_status = None;

        for attempt in 0..=self.config.max_retries {
            match self.send(url).await {
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status.as_u16());

                    if !status.is_success() {
                        last_error = Some(AggregatorError::General(format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        )));

                        // Client errors will not go away by asking again
                        if status.is_client_error() {
                            break;
                        }
                    } else {
                        match self.read_body(response).await {
                            Ok(content) => {
                                info!("Fetched feed: {} ({} bytes)", url, content.len());
                                return Ok(FetchResult {
                                    url: url.to_string(),
                                    success: true,
                                    error: None,
                                    response_time_ms: start_time.elapsed().as_millis() as u64,
                                    http_status: Some(status.as_u16()),
                                    content: Some(content),
                                });
                            }
                            Err(e @ AggregatorError::FeedTooLarge { .. }) => {
                                return Ok(self.failure(url, start_time, Some(status.as_u16()), e));
                            }
                            Err(e) => {
                                last_error = Some(e);
                            }
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        let error = last_error.unwrap_or_else(|| AggregatorError::General("Unknown error".to_string()));
        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);

        Ok(self.failure(url, start_time, last_status, error))
    }

    async fn send(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await?;
        Ok(response)
    }

    /// Read the body, giving up as soon as it outgrows `max_feed_size_mb`.
    ///
    /// Chunked responses carry no length up front, so the limit is checked per chunk.
    async fn read_body(&self, mut response: Response) -> Result<String> {
        let limit = self.config.max_feed_size_mb.saturating_mul(BYTES_PER_MB);

        if let Some(content_length) = response.content_length() {
            let content_length = usize::try_from(content_length).unwrap_or(usize::MAX);
            if content_length > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: content_length / BYTES_PER_MB,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: body.len() / BYTES_PER_MB,
                });
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn failure(&self, url: &str, start_time: Instant, http_status: Option<u16>, error: AggregatorError) -> FetchResult {
        FetchResult {
            url: url.to_string(),
            success: false,
            error: Some(error.to_string()),
            response_time_ms: start_time.elapsed().as_millis() as u64,
            http_status,
            content: None,
        }
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();

        let now = Instant::now();
        let min_interval = Duration::from_secs(1); // Minimum 1 second between requests to same host

        let mut rate_limiter = self.rate_limiter.write().await;

        if let Some(last_request) = rate_limiter.get(&host) {
            let elapsed = now.duration_since(*last_request);
            if elapsed < min_interval {
                let wait_time = min_interval - elapsed;
                debug!("Rate limiting {}: waiting {:?}", host, wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        rate_limiter.insert(host, Instant::now());

        Ok(())
    }
}
