pub mod types;
pub mod config;
pub mod sanitizer;
pub mod avatar;
pub mod normalizer;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod aggregator;
pub mod publish;

pub use types::*;
pub use config::PlanetConfig;
pub use sanitizer::{sanitize, SecurityPolicy, RewriteKind};
pub use avatar::resolve_avatar;
pub use normalizer::{normalize, DateFormatter, NormalizeSettings};
pub use traits::{FetchEntries, Publisher};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::HttpFeedSource;
pub use aggregator::PlanetAggregator;
