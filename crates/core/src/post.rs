//! Raw input rows and the post payload they carry.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Millis, TrendResult};

/// One row from the upstream store: the post as a JSON string plus its retweet flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    pub json: String,
    pub is_retweet: bool,
}

impl RawRecord {
    pub fn new(json: impl Into<String>, is_retweet: bool) -> Self {
        Self { json: json.into(), is_retweet }
    }

    pub fn parse_post(&self) -> TrendResult<Post> {
        Ok(serde_json::from_str(&self.json)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(deserialize_with = "millis_from_number_or_string")]
    pub timestamp_ms: Millis,
    #[serde(default)]
    pub text: Option<String>,
    pub entities: Entities,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entities {
    pub user_mentions: Vec<UserMention>,
    pub hashtags: Vec<Hashtag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMention {
    pub screen_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hashtag {
    pub text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MillisRepr {
    Int(i64),
    Text(String),
}

// The streaming feed ships `timestamp_ms` as a decimal string.
fn millis_from_number_or_string<'de, D>(deserializer: D) -> Result<Millis, D::Error>
where
    D: Deserializer<'de>,
{
    match MillisRepr::deserialize(deserializer)? {
        MillisRepr::Int(ms) => Ok(ms),
        MillisRepr::Text(raw) => raw
            .trim()
            .parse::<Millis>()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp_ms {raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_string_timestamps() {
        let a = RawRecord::new(
            r#"{"timestamp_ms":1000,"text":"hi","entities":{"user_mentions":[],"hashtags":[]}}"#,
            false,
        );
        assert_eq!(a.parse_post().unwrap().timestamp_ms, 1000);

        let b = RawRecord::new(
            r#"{"timestamp_ms":"1451606400000","entities":{"user_mentions":[],"hashtags":[]}}"#,
            false,
        );
        let post = b.parse_post().unwrap();
        assert_eq!(post.timestamp_ms, 1_451_606_400_000);
        assert_eq!(post.text, None);
    }

    #[test]
    fn missing_entities_is_a_parse_error() {
        let rec = RawRecord::new(r#"{"timestamp_ms":1000,"text":"hi"}"#, false);
        let err = rec.parse_post().unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let rec = RawRecord::new("{not json", false);
        assert!(rec.parse_post().unwrap_err().is_parse());
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let rec = RawRecord::new(
            r#"{"timestamp_ms":"soon","entities":{"user_mentions":[],"hashtags":[]}}"#,
            false,
        );
        assert!(rec.parse_post().is_err());
    }
}
