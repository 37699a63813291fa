use serde::{Deserialize, Serialize};
use tt_core::{Millis, Post, RawRecord, TrendError, TrendResult};

/// Predicate over raw posts. Needles are stored lowercased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordFilter {
    contains: Vec<String>,
    not_contains: Vec<String>,
    allow_retweets: bool,
    start_ms: Option<Millis>,
    stop_ms: Option<Millis>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            contains: Vec::new(),
            not_contains: Vec::new(),
            allow_retweets: true,
            start_ms: None,
            stop_ms: None,
        }
    }
}

impl RecordFilter {
    pub fn allow_retweets(mut self, allow: bool) -> Self {
        self.allow_retweets = allow;
        self
    }

    pub fn contains<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.contains = normalize(needles);
        self
    }

    pub fn not_contains<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.not_contains = normalize(needles);
        self
    }

    pub fn start(mut self, start_ms: Option<Millis>) -> Self {
        self.start_ms = start_ms;
        self
    }

    pub fn stop(mut self, stop_ms: Option<Millis>) -> Self {
        self.stop_ms = stop_ms;
        self
    }

    pub fn retweets_allowed(&self) -> bool {
        self.allow_retweets
    }

    /// Accepts or rejects a raw row. Retweets are rejected without looking at the payload;
    /// anything else must parse.
    pub fn accept(&self, record: &RawRecord) -> TrendResult<bool> {
        if self.rejects_retweet(record) {
            return Ok(false);
        }
        let post = record.parse_post()?;
        self.accept_post(&post)
    }

    pub fn rejects_retweet(&self, record: &RawRecord) -> bool {
        !self.allow_retweets && record.is_retweet
    }

    /// Time bounds and text needles against an already parsed post.
    pub fn accept_post(&self, post: &Post) -> TrendResult<bool> {
        if let Some(start) = self.start_ms {
            if post.timestamp_ms < start {
                return Ok(false);
            }
        }
        if let Some(stop) = self.stop_ms {
            if post.timestamp_ms > stop {
                return Ok(false);
            }
        }
        if self.contains.is_empty() && self.not_contains.is_empty() {
            return Ok(true);
        }

        let text = post
            .text
            .as_deref()
            .ok_or_else(|| TrendError::parse("missing field `text`"))?
            .to_lowercase();

        if !self.contains.is_empty() && !self.contains.iter().any(|n| text.contains(n.as_str())) {
            return Ok(false);
        }
        if self.not_contains.iter().any(|n| text.contains(n.as_str())) {
            return Ok(false);
        }
        Ok(true)
    }
}

fn normalize<I, S>(needles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    needles
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
