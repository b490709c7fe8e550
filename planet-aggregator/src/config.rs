use crate::normalizer::{DateFormatter, NormalizeSettings};
use crate::sanitizer::SecurityPolicy;
use crate::types::{AggregatorError, FetchConfig, Result, SourceSpec};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Run configuration, read once at start and immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanetConfig {
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    pub planet: PlanetSettings,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub secure: SecurityPolicy,
    #[serde(default)]
    pub people: Vec<SourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanetSettings {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default)]
    pub max_posts: Option<usize>,
}

fn default_base_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("public")
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

impl PlanetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AggregatorError::Config(format!("reading {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlanetConfig =
            toml::from_str(content).map_err(|e| AggregatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for source in &self.people {
            if !is_valid_feed_url(&source.link) {
                return Err(AggregatorError::Config(format!(
                    "source {} has an invalid link: {:?}",
                    source.name.as_deref().unwrap_or("<unnamed>"),
                    source.link
                )));
            }
        }
        Ok(())
    }

    /// Where publishers write: `base_path/planet.output`.
    pub fn output_dir(&self) -> PathBuf {
        self.base_path.join(&self.planet.output)
    }

    pub fn normalize_settings(&self) -> Result<NormalizeSettings> {
        let formatter = DateFormatter::new(&self.planet.locale, self.planet.time_format.clone())?;
        Ok(NormalizeSettings::new(formatter, self.secure.clone()))
    }
}

/// Only http(s) feeds can be fetched.
pub fn is_valid_feed_url(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}
