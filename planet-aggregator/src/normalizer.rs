use crate::avatar::resolve_avatar;
use crate::sanitizer::{host_from_channel, sanitize, RewriteKind, SecurityPolicy};
use crate::types::{AggregatorError, PostRecord, RawEntry, Result, SourceSpec};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Locale, Utc};
use std::fmt::Write;
use tracing::{debug, warn};

/// Formats instants for display in one fixed locale.
///
/// The locale travels with the formatter instead of living in process wide
/// state, so sources with different locales can be normalized side by side.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    format: String,
}

impl DateFormatter {
    /// `format` is a strftime string, `locale` something like `fr_FR`, `fr-fr` or `fr`.
    pub fn new(locale: &str, format: impl Into<String>) -> Result<Self> {
        let format = format.into();

        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(AggregatorError::Config(format!(
                "invalid time format: {}",
                format
            )));
        }

        let locale = parse_locale(locale).unwrap_or_else(|| {
            warn!("Unknown locale {}, falling back to POSIX", locale);
            Locale::POSIX
        });

        Ok(Self { locale, format })
    }

    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        let mut out = String::new();
        if write!(out, "{}", instant.format_localized(&self.format, self.locale)).is_err() {
            return instant.to_rfc3339();
        }
        out
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::en_US,
            format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

fn parse_locale(name: &str) -> Option<Locale> {
    let normalized = name.trim().replace('-', "_");
    let (language, region) = match normalized.split_once('_') {
        Some((language, region)) => (language.to_ascii_lowercase(), Some(region.to_ascii_uppercase())),
        None => (normalized.to_ascii_lowercase(), None),
    };

    let mut candidates = vec![normalized.clone()];
    match region {
        Some(region) => candidates.push(format!("{}_{}", language, region)),
        None => {
            candidates.push(language.clone());
            candidates.push(format!("{}_{}", language, language.to_ascii_uppercase()));
            if language == "en" {
                candidates.push("en_US".to_string());
            }
        }
    }

    candidates
        .iter()
        .find_map(|candidate| Locale::try_from(candidate.as_str()).ok())
}

/// Everything normalization needs beyond the entry itself.
#[derive(Debug, Clone, Default)]
pub struct NormalizeSettings {
    pub formatter: DateFormatter,
    pub policy: SecurityPolicy,
}

impl NormalizeSettings {
    pub fn new(formatter: DateFormatter, policy: SecurityPolicy) -> Self {
        Self { formatter, policy }
    }
}

/// Turn one raw entry into a post record.
pub fn normalize(
    entry: &RawEntry,
    avatar_identity: Option<&str>,
    settings: &NormalizeSettings,
) -> PostRecord {
    build_record(entry, avatar_identity, None, settings)
}

/// Same as [`normalize`], taking avatar and display name from the source.
pub fn normalize_from_source(
    entry: &RawEntry,
    source: &SourceSpec,
    settings: &NormalizeSettings,
) -> PostRecord {
    build_record(entry, source.avatar.as_deref(), source.name.clone(), settings)
}

fn build_record(
    entry: &RawEntry,
    avatar_identity: Option<&str>,
    source_name: Option<String>,
    settings: &NormalizeSettings,
) -> PostRecord {
    let host = host_from_channel(&entry.meta.link);
    let formatter = &settings.formatter;

    let (date, update, sort_key) = match (entry.pubdate, entry.date) {
        (Some(published), Some(updated)) if published == updated => {
            (formatter.format(&published), None, published.timestamp())
        }
        (Some(published), Some(updated)) => (
            formatter.format(&published),
            Some(formatter.format(&updated)),
            updated.timestamp(),
        ),
        (Some(published), None) => (formatter.format(&published), None, published.timestamp()),
        // pubdate falls back to date, which makes the two equal
        (None, Some(updated)) => (formatter.format(&updated), None, updated.timestamp()),
        (None, None) => {
            warn!("Entry {} has no usable date, sorting it at the epoch", entry.link);
            (String::new(), None, 0)
        }
    };

    let link = entry.origlink.clone().unwrap_or_else(|| entry.link.clone());
    let content = sanitize(&entry.description, host, &link, &settings.policy);
    let avatar = resolve_avatar(avatar_identity);

    debug!("Normalized {} (sort key {})", link, sort_key);

    PostRecord {
        sort_key,
        title: entry.title.clone(),
        author: entry.author.clone(),
        date,
        update,
        categories: entry.categories.clone(),
        link,
        summary: entry.summary.clone(),
        content,
        channel: entry.meta.link.clone(),
        xml: feed_url(host, &entry.meta.xmlurl),
        avatar,
        source_name,
    }
}

/// Absolute location of the feed: `host + xmlurl` for paths, untouched when already absolute.
pub fn feed_url(host: &str, xmlurl: &str) -> String {
    if xmlurl.is_empty() {
        return host.to_string();
    }
    RewriteKind::Image.rewrite(xmlurl, host, host)
}
