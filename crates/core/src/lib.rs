//! Core types and errors for Timely Trends.

use serde::{Deserialize, Serialize};

pub mod post;
pub mod time;

pub use post::{Entities, Hashtag, Post, RawRecord, UserMention};

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

pub type TrendResult<T> = Result<T, TrendError>;

pub const MENTION_MARKER: char = '@';
pub const HASHTAG_MARKER: char = '#';

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Mention,
    Hashtag,
}

impl EntityKind {
    pub fn marker(&self) -> char {
        match self {
            EntityKind::Mention => MENTION_MARKER,
            EntityKind::Hashtag => HASHTAG_MARKER,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Mention => "mention",
            EntityKind::Hashtag => "hashtag",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "mention" => Some(EntityKind::Mention),
            "hashtag" => Some(EntityKind::Hashtag),
            _ => None,
        }
    }

    /// Classifies a marked token by its leading character. Anything that is not a
    /// mention is a hashtag.
    pub fn of_token(token: &str) -> Self {
        Self::of_marker(token.chars().next().unwrap_or(HASHTAG_MARKER))
    }

    pub fn of_marker(marker: char) -> Self {
        if marker == MENTION_MARKER {
            EntityKind::Mention
        } else {
            EntityKind::Hashtag
        }
    }
}

/// A marked, lowercased entity token stamped with the time of its post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityEvent {
    pub token: String,
    pub timestamp_ms: Millis,
}

impl EntityEvent {
    pub fn new(kind: EntityKind, name: &str, timestamp_ms: Millis) -> Self {
        let mut token = String::with_capacity(name.len() + 1);
        token.push(kind.marker());
        token.push_str(&name.to_lowercase());
        Self { token, timestamp_ms }
    }

    pub fn kind(&self) -> EntityKind {
        EntityKind::of_token(&self.token)
    }
}

/// Half-open interval `[start_ms, start_ms + size_ms)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Window {
    pub start_ms: Millis,
    pub size_ms: Millis,
}

impl Window {
    pub fn new(start_ms: Millis, size_ms: Millis) -> Self {
        Self { start_ms, size_ms }
    }

    pub fn end_ms(&self) -> Millis {
        self.start_ms.saturating_add(self.size_ms)
    }

    pub fn contains(&self, timestamp_ms: Millis) -> bool {
        self.start_ms <= timestamp_ms && timestamp_ms < self.end_ms()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowedCount {
    pub window: Window,
    pub token: String,
    pub count: u64,
}

/// Ranked tokens of one entity kind within one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedGroup {
    pub kind: EntityKind,
    pub window_start_ms: Millis,
    pub ranked: Vec<(String, u64)>,
}

#[derive(thiserror::Error, Debug)]
pub enum TrendError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("parse error{}: {reason}", in_record(.record))]
    Parse { record: Option<usize>, reason: String },
    #[error("resource error ({what}): {source}")]
    Resource {
        what: String,
        #[source]
        source: std::io::Error,
    },
    #[error("runtime error: {0}")]
    Runtime(String),
}

fn in_record(record: &Option<usize>) -> String {
    match record {
        Some(n) => format!(" in record {n}"),
        None => String::new(),
    }
}

impl TrendError {
    pub fn config(reason: impl Into<String>) -> Self {
        TrendError::Configuration(reason.into())
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        TrendError::Parse { record: None, reason: reason.into() }
    }

    pub fn resource(what: impl Into<String>, source: std::io::Error) -> Self {
        TrendError::Resource { what: what.into(), source }
    }

    /// Attaches the 1-based record ordinal to a parse error; other kinds pass through.
    pub fn at(self, record: usize) -> Self {
        match self {
            TrendError::Parse { reason, .. } => TrendError::Parse { record: Some(record), reason },
            other => other,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, TrendError::Parse { .. })
    }
}

impl From<serde_json::Error> for TrendError {
    fn from(err: serde_json::Error) -> Self {
        TrendError::parse(err.to_string())
    }
}
