use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured feed origin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceSpec {
    pub link: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl SourceSpec {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            avatar: None,
            name: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Channel level data repeated on every entry of a fetched feed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelMeta {
    /// Website of the channel, used as the base for relative urls.
    pub link: String,
    /// Location of the feed document itself. May be relative to `link`.
    pub xmlurl: String,
    pub title: Option<String>,
}

/// One unprocessed item as handed over by a fetch collaborator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: String,
    pub author: Option<String>,
    pub pubdate: Option<DateTime<Utc>>,
    // equals pubdate when the entry was never edited
    pub date: Option<DateTime<Utc>>,
    pub link: String,
    pub origlink: Option<String>,
    pub summary: Option<String>,
    pub description: String,
    pub categories: Vec<String>,
    pub meta: ChannelMeta,
}

/// The normalized, sanitized, absolutely-linked output unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Unix seconds used for ordering, newest first.
    pub sort_key: i64,
    pub title: String,
    pub author: Option<String>,
    pub date: String,
    pub update: Option<String>,
    pub categories: Vec<String>,
    pub link: String,
    pub summary: Option<String>,
    pub content: String,
    pub channel: String,
    pub xml: String,
    pub avatar: Option<String>,
    pub source_name: Option<String>,
}

// Object style note:
// A run is a single short lived pass. Records are built once by the
// normalizer and only read afterwards, so nothing here carries interior
// mutability or identity beyond its fields.
