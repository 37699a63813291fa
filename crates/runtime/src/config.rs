//! Recognized run options and their validation into typed settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tt_core::time::parse_instant;
use tt_core::{TrendError, TrendResult};
use tt_filters::{parse_list, EntityFilter, RecordFilter};
use tt_views::{TopKConfig, WindowSpec};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Dataflow,
    Sequential,
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dataflow" => Ok(Engine::Dataflow),
            "sequential" => Ok(Engine::Sequential),
            other => Err(format!("unknown engine {other:?} (expected dataflow or sequential)")),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Dataflow => f.write_str("dataflow"),
            Engine::Sequential => f.write_str("sequential"),
        }
    }
}

/// What to do with a record whose payload does not parse.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Count the record as skipped and carry on. Changes output composition.
    Skip,
}

impl FromStr for ParsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(ParsePolicy::Fail),
            "skip" => Ok(ParsePolicy::Skip),
            other => Err(format!("unknown parse policy {other:?} (expected fail or skip)")),
        }
    }
}

impl fmt::Display for ParsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePolicy::Fail => f.write_str("fail"),
            ParsePolicy::Skip => f.write_str("skip"),
        }
    }
}

/// Raw options as supplied by the user, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendOptions {
    /// Sliding window length in minutes.
    pub window_size: i64,
    /// Sliding window stride in minutes.
    pub window_freq: i64,
    pub save_to: Option<PathBuf>,
    pub read_from: Option<PathBuf>,
    /// Include retweets.
    pub retweet: bool,
    pub contains: Option<String>,
    pub not_contains: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub filter_entities: Option<String>,
    pub top_k: usize,
    pub workers: usize,
    pub engine: Engine,
    pub on_parse_error: ParsePolicy,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            window_size: 30,
            window_freq: 5,
            save_to: None,
            read_from: None,
            retweet: true,
            contains: None,
            not_contains: None,
            start: None,
            stop: None,
            filter_entities: None,
            top_k: TopKConfig::default().k,
            workers: 1,
            engine: Engine::default(),
            on_parse_error: ParsePolicy::default(),
        }
    }
}

/// Everything the engines need; shared by value with every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub record_filter: RecordFilter,
    pub entity_filter: EntityFilter,
    pub windows: WindowSpec,
    pub top_k: TopKConfig,
    pub parse_policy: ParsePolicy,
}

#[derive(Debug, Clone)]
pub struct TrendConfig {
    pub read_from: PathBuf,
    pub save_to: PathBuf,
    pub engine: Engine,
    pub workers: usize,
    pub settings: PipelineSettings,
}

impl TrendOptions {
    pub fn validate(&self) -> TrendResult<TrendConfig> {
        let read_from = self
            .read_from
            .clone()
            .ok_or_else(|| TrendError::config("missing required option readFrom"))?;
        let save_to = self
            .save_to
            .clone()
            .ok_or_else(|| TrendError::config("missing required option saveTo"))?;
        if self.workers == 0 {
            return Err(TrendError::config("workers must be at least 1"));
        }
        Ok(TrendConfig {
            read_from,
            save_to,
            engine: self.engine,
            workers: self.workers,
            settings: self.settings()?,
        })
    }

    /// Validates everything except the source and sink locations.
    pub fn settings(&self) -> TrendResult<PipelineSettings> {
        let windows = WindowSpec::from_minutes(self.window_size, self.window_freq)?;
        if self.top_k == 0 {
            return Err(TrendError::config("topK must be at least 1"));
        }

        let start_ms = self.start.as_deref().map(parse_instant).transpose()?;
        let stop_ms = self.stop.as_deref().map(parse_instant).transpose()?;
        if let (Some(start), Some(stop)) = (start_ms, stop_ms) {
            if start > stop {
                return Err(TrendError::config(format!(
                    "start ({start}) is after stop ({stop})"
                )));
            }
        }

        let record_filter = RecordFilter::default()
            .allow_retweets(self.retweet)
            .contains(self.contains.as_deref().map(parse_list).unwrap_or_default())
            .not_contains(self.not_contains.as_deref().map(parse_list).unwrap_or_default())
            .start(start_ms)
            .stop(stop_ms);

        let entity_filter = match self.filter_entities.as_deref() {
            Some(raw) => EntityFilter::exclude(parse_list(raw)),
            None => EntityFilter::unset(),
        };

        Ok(PipelineSettings {
            record_filter,
            entity_filter,
            windows,
            top_k: TopKConfig { k: self.top_k },
            parse_policy: self.on_parse_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> TrendOptions {
        TrendOptions {
            read_from: Some("in.jsonl".into()),
            save_to: Some("out.csv".into()),
            ..TrendOptions::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let cfg = opts().validate().unwrap();
        assert_eq!(cfg.settings.windows, WindowSpec::default());
        assert_eq!(cfg.settings.top_k.k, 10);
        assert_eq!(cfg.engine, Engine::Dataflow);
        assert!(cfg.settings.record_filter.retweets_allowed());
        assert!(!cfg.settings.entity_filter.is_set());
    }

    #[test]
    fn missing_locations_are_configuration_errors() {
        let mut o = opts();
        o.save_to = None;
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));
        let mut o = opts();
        o.read_from = None;
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));
    }

    #[test]
    fn bad_timestamps_and_geometry_are_rejected() {
        let mut o = opts();
        o.start = Some("not a date".into());
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));

        let mut o = opts();
        o.window_freq = 60;
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));

        let mut o = opts();
        o.start = Some("2016-01-02T00:00:00Z".into());
        o.stop = Some("2016-01-01T00:00:00Z".into());
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));

        let mut o = opts();
        o.top_k = 0;
        assert!(o.validate().is_err());
    }

    #[test]
    fn oversized_windows_fail_validation() {
        let mut o = opts();
        o.window_size = i64::MAX;
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));

        let mut o = opts();
        o.window_size = 1_000_000_000_000;
        assert!(matches!(o.validate(), Err(TrendError::Configuration(_))));
    }

    #[test]
    fn deserializes_camel_case_options() {
        let raw = r#"{"readFrom":"a","saveTo":"b","windowSize":60,"filterEntities":"bob","onParseError":"skip"}"#;
        let o: TrendOptions = serde_json::from_str(raw).unwrap();
        assert_eq!(o.window_size, 60);
        assert_eq!(o.window_freq, 5);
        assert_eq!(o.on_parse_error, ParsePolicy::Skip);
        let settings = o.settings().unwrap();
        assert!(!settings.entity_filter.include("@bob"));
    }

    #[test]
    fn engine_and_policy_parse_from_str() {
        assert_eq!("Sequential".parse::<Engine>().unwrap(), Engine::Sequential);
        assert_eq!("skip".parse::<ParsePolicy>().unwrap(), ParsePolicy::Skip);
        assert!("fast".parse::<Engine>().is_err());
    }
}
