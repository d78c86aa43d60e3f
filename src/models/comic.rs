//! Comic sources, identifiers and persisted records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Record class tag shared by every comic record.
pub const COMIC_KIND: &str = "comic";

/// A tracked webcomic site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComicSource {
    Xkcd,
    Smbc,
    Jl8,
}

impl ComicSource {
    /// Every known source, in the order a cron pass visits them.
    pub const ALL: [ComicSource; 3] = [ComicSource::Xkcd, ComicSource::Smbc, ComicSource::Jl8];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xkcd => "xkcd",
            Self::Smbc => "smbc",
            Self::Jl8 => "jl8",
        }
    }

    /// Cache key holding the latest identifier for this source.
    pub fn cache_key(&self) -> String {
        format!("{}-latest", self.as_str())
    }

    /// Template used for both the page and the notification mail.
    pub fn template_name(&self) -> String {
        format!("{}.html", self.as_str())
    }
}

impl FromStr for ComicSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "xkcd" => Ok(Self::Xkcd),
            "smbc" => Ok(Self::Smbc),
            "jl8" => Ok(Self::Jl8),
            other => Err(AppError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for ComicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value that says which strip is currently the latest.
///
/// Serialized untagged, so the stored JSON is `["url", "caption"]`, `42`
/// or `"url"` depending on the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Image URL and caption.
    Pair(String, String),
    /// Numeric strip id.
    Number(i64),
    /// Image URL.
    Url(String),
}

impl Identifier {
    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored JSON value. Anything unreadable, including `null`,
    /// is treated as no prior value.
    pub fn from_json(raw: &str) -> Option<Identifier> {
        serde_json::from_str::<Option<Identifier>>(raw).ok().flatten()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair(url, caption) => write!(f, "[{url:?}, {caption:?}]"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Url(url) => write!(f, "{url:?}"),
        }
    }
}

/// Last-seen state for one comic source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicRecord {
    /// Source name as stored
    pub source: String,

    /// Record class tag
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Serialized last-seen identifier
    #[serde(default)]
    pub last_json: Option<String>,

    /// When `last_json` was last changed
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_kind() -> String {
    COMIC_KIND.to_string()
}

impl ComicRecord {
    /// A fresh record that has never seen a strip.
    pub fn new(source: ComicSource) -> Self {
        Self {
            source: source.as_str().to_string(),
            kind: default_kind(),
            last_json: None,
            updated_at: None,
        }
    }

    /// Parsed source, if it is one we know.
    pub fn comic_source(&self) -> Result<ComicSource> {
        self.source.parse()
    }

    /// Deserialized last-seen identifier.
    pub fn last_seen(&self) -> Option<Identifier> {
        self.last_json.as_deref().and_then(Identifier::from_json)
    }

    /// Serialize and store a new last-seen identifier.
    pub fn set_last_seen(&mut self, identifier: &Identifier) -> Result<()> {
        self.last_json = Some(identifier.to_json()?);
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}
