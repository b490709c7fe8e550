use crate::types::{AggregatorError, ChannelMeta, RawEntry, Result};
use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser;
use tracing::{debug, info};
use url::Url;

/// Turns fetched RSS/Atom documents into raw entries.
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `content`, fetched from `source_url`, into raw entries.
    pub fn parse_feed(&self, content: &str, source_url: &str) -> Result<Vec<RawEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let meta = Self::channel_meta(&feed, source_url);
        let feed_author = feed.authors.first().map(|a| a.name.clone());

        let entries: Vec<RawEntry> = feed
            .entries
            .into_iter()
            .filter_map(|entry| Self::parse_entry(entry, &meta, feed_author.as_deref()))
            .collect();

        info!("Parsed feed {} with {} entries", source_url, entries.len());
        Ok(entries)
    }

    fn channel_meta(feed: &Feed, source_url: &str) -> ChannelMeta {
        // Blogger and friends list feed, hub and paging links next to the site
        let link = feed
            .links
            .iter()
            .find(|l| is_page_link(l))
            .map(|l| l.href.clone())
            .or_else(|| site_origin(source_url))
            .unwrap_or_default();

        let xmlurl = feed
            .links
            .iter()
            .find(|l| is_rel(l, "self"))
            .map(|l| l.href.clone())
            .unwrap_or_else(|| source_url.to_string());

        ChannelMeta {
            link,
            xmlurl,
            title: feed.title.as_ref().map(|t| t.content.clone()),
        }
    }

    fn parse_entry(entry: Entry, meta: &ChannelMeta, feed_author: Option<&str>) -> Option<RawEntry> {
        let link = match Self::entry_link(&entry) {
            Some(link) => link,
            None => {
                debug!("Skipping entry {} from {}: no link", entry.id, meta.xmlurl);
                return None;
            }
        };

        let origlink = entry
            .links
            .iter()
            .find(|l| is_rel(l, "canonical") || is_rel(l, "original"))
            .map(|l| l.href.clone());

        let title = entry.title.map(|t| t.content).unwrap_or_else(|| "Untitled".to_string());
        let summary = entry.summary.map(|s| s.content);

        // Prefer full content over summary for the body
        let description = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| summary.clone())
            .unwrap_or_default();

        let author = entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .or_else(|| feed_author.map(str::to_string));

        // Missing publish or update times borrow from each other
        let pubdate = entry.published.or(entry.updated);
        let date = entry.updated.or(entry.published);

        let categories = entry.categories.into_iter().map(|c| c.term).collect();

        Some(RawEntry {
            title,
            author,
            pubdate,
            date,
            link,
            origlink,
            summary,
            description,
            categories,
            meta: meta.clone(),
        })
    }

    /// The page link of an entry, or its id when that is itself a web url.
    fn entry_link(entry: &Entry) -> Option<String> {
        entry
            .links
            .iter()
            .find(|l| is_page_link(l))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .or_else(|| is_web_url(&entry.id).then(|| entry.id.clone()))
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_rel(link: &Link, rel: &str) -> bool {
    link.rel.as_deref().map(|r| r.eq_ignore_ascii_case(rel)).unwrap_or(false)
}

fn is_page_link(link: &Link) -> bool {
    link.rel.is_none() || is_rel(link, "alternate")
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| url.scheme() == "http" || url.scheme() == "https")
        .unwrap_or(false)
}

fn site_origin(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    Some(url.origin().ascii_serialization())
}
