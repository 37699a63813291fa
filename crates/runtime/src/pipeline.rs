//! The record-level stages shared by both engines, the sequential engine, and the
//! source-to-sink orchestration.

use std::sync::Arc;

use tracing::{info, warn};
use tt_core::{EntityEvent, RawRecord, TrendResult, TypedGroup};
use tt_filters::extract_post;
use tt_views::{format_group, rank_groups, WindowCounter};

use crate::config::{Engine, ParsePolicy, PipelineSettings, TrendConfig};
use crate::dataflow::run_dataflow;
use crate::io::{LineSink, RecordSource};
use crate::metrics::{MetricsRegistry, StageTimer};

/// Filter, extract and entity-filter one record. `index` is the 0-based position of the
/// record in the input.
pub fn record_events(
    index: usize,
    record: &RawRecord,
    settings: &PipelineSettings,
    metrics: &MetricsRegistry,
) -> TrendResult<Vec<EntityEvent>> {
    metrics.inc_records_read(1);
    if settings.record_filter.rejects_retweet(record) {
        metrics.inc_records_rejected(1);
        return Ok(Vec::new());
    }

    let accepted = record.parse_post().and_then(|post| {
        Ok(settings
            .record_filter
            .accept_post(&post)?
            .then(|| extract_post(&post)))
    });

    let events = match accepted {
        Ok(Some(events)) => events,
        Ok(None) => {
            metrics.inc_records_rejected(1);
            return Ok(Vec::new());
        }
        Err(err) if err.is_parse() && settings.parse_policy == ParsePolicy::Skip => {
            warn!(record = index + 1, %err, "skipping unparsable record");
            metrics.inc_records_skipped(1);
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.at(index + 1)),
    };

    metrics.inc_entities_extracted(events.len() as u64);
    let before = events.len();
    let kept: Vec<EntityEvent> = events
        .into_iter()
        .filter(|ev| settings.entity_filter.include(&ev.token))
        .collect();
    metrics.inc_entities_dropped((before - kept.len()) as u64);
    Ok(kept)
}

/// Stages 1-8 as a plain loop over an in-memory batch.
pub fn run_sequential(
    records: &[RawRecord],
    settings: &PipelineSettings,
    metrics: &MetricsRegistry,
) -> TrendResult<Vec<TypedGroup>> {
    let mut counter = WindowCounter::new();
    for (index, record) in records.iter().enumerate() {
        for event in record_events(index, record, settings, metrics)? {
            let assigned = counter.observe_event(&event, &settings.windows);
            metrics.inc_window_assignments(assigned as u64);
        }
    }
    info!(
        windows = counter.open_windows(),
        keys = counter.len(),
        "all input counted"
    );
    let groups = rank_groups(counter.finish(), settings.top_k);
    metrics.inc_groups_emitted(groups.len() as u64);
    Ok(groups)
}

pub fn run_engine(
    engine: Engine,
    workers: usize,
    records: Vec<RawRecord>,
    settings: &PipelineSettings,
    metrics: &MetricsRegistry,
) -> TrendResult<Vec<TypedGroup>> {
    match engine {
        Engine::Sequential => run_sequential(&records, settings, metrics),
        Engine::Dataflow => run_dataflow(Arc::new(records), settings.clone(), workers, metrics),
    }
}

/// Reads the whole source, runs the configured engine and hands every line to the sink.
/// Returns the number of lines written. Nothing reaches the sink unless the run succeeds.
pub fn run<S, K>(
    config: &TrendConfig,
    source: &mut S,
    sink: &mut K,
    metrics: &MetricsRegistry,
) -> TrendResult<usize>
where
    S: RecordSource + ?Sized,
    K: LineSink + ?Sized,
{
    let timer = StageTimer::start();
    let records = source.read_all()?;
    info!(records = records.len(), engine = %config.engine, "input loaded");

    let groups = run_engine(config.engine, config.workers, records, &config.settings, metrics)?;
    let lines: Vec<String> = groups.iter().map(format_group).collect();
    sink.write_all(&lines)?;

    info!(
        lines = lines.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "run complete"
    );
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_core::EntityKind;
    use tt_filters::EntityFilter;

    fn post(ts: i64, text: &str, mentions: &[&str], tags: &[&str]) -> String {
        serde_json::json!({
            "timestamp_ms": ts,
            "text": text,
            "entities": {
                "user_mentions": mentions.iter().map(|m| serde_json::json!({ "screen_name": m })).collect::<Vec<_>>(),
                "hashtags": tags.iter().map(|t| serde_json::json!({ "text": t })).collect::<Vec<_>>(),
            },
        })
        .to_string()
    }

    #[test]
    fn drops_blacklisted_entities_and_counts_them() {
        let settings = PipelineSettings {
            entity_filter: EntityFilter::exclude(["bob"]),
            ..PipelineSettings::default()
        };
        let metrics = MetricsRegistry::default();
        let rec = RawRecord::new(post(1, "x", &["Bob", "amy"], &["go"]), false);
        let events = record_events(0, &rec, &settings, &metrics).unwrap();
        let tokens: Vec<&str> = events.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, vec!["@amy", "#go"]);
        let snap = metrics.snapshot();
        assert_eq!(snap.entities_extracted, 3);
        assert_eq!(snap.entities_dropped, 1);
    }

    #[test]
    fn parse_failure_aborts_by_default() {
        let metrics = MetricsRegistry::default();
        let records = vec![
            RawRecord::new(post(1, "x", &["a"], &[]), false),
            RawRecord::new("{broken", false),
        ];
        let err = run_sequential(&records, &PipelineSettings::default(), &metrics).unwrap_err();
        assert!(err.to_string().contains("record 2"), "{err}");
    }

    #[test]
    fn parse_failure_skipped_on_request() {
        let settings = PipelineSettings {
            parse_policy: ParsePolicy::Skip,
            ..PipelineSettings::default()
        };
        let metrics = MetricsRegistry::default();
        let records = vec![
            RawRecord::new(post(1, "x", &["a"], &[]), false),
            RawRecord::new("{broken", false),
        ];
        let groups = run_sequential(&records, &settings, &metrics).unwrap();
        assert!(groups.iter().all(|g| g.kind == EntityKind::Mention));
        assert_eq!(metrics.snapshot().records_skipped, 1);
    }

    #[test]
    fn sequential_counts_in_every_sliding_window() {
        let metrics = MetricsRegistry::default();
        let records = vec![RawRecord::new(post(60_000 * 12, "x", &[], &["go"]), false)];
        let groups = run_sequential(&records, &PipelineSettings::default(), &metrics).unwrap();
        assert_eq!(groups.len(), 6);
        assert!(groups.iter().all(|g| g.ranked == vec![("#go".to_string(), 1)]));
        assert_eq!(metrics.snapshot().window_assignments, 6);
    }
}
