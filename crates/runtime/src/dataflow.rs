//! The windowed aggregation as a differential dataflow across timely workers.
//!
//! Records are sharded round-robin over workers for the record-level stages. Windowed
//! events are exchanged by `(window start, token)` for counting and by
//! `(window start, kind)` for ranking. All input lives in epoch 0; results are read once
//! the probe has passed it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use differential_dataflow::input::InputSession;
use differential_dataflow::operators::reduce::Reduce;
use timely::dataflow::operators::probe::Handle as ProbeHandle;
use tracing::{debug, info};

use tt_core::{EntityKind, Millis, RawRecord, TrendResult, TypedGroup};
use tt_views::{select_top_k, split};

use crate::config::PipelineSettings;
use crate::metrics::MetricsRegistry;
use crate::pipeline::record_events;
use crate::start_runtime;

pub fn run_dataflow(
    records: Arc<Vec<RawRecord>>,
    settings: PipelineSettings,
    workers: usize,
    metrics: &MetricsRegistry,
) -> TrendResult<Vec<TypedGroup>> {
    let shared_metrics = metrics.clone();
    let per_worker = start_runtime(workers, move |index, worker| {
        let metrics = shared_metrics.clone();
        let peers = worker.peers();
        let spec = settings.windows;
        let k = settings.top_k.k;

        let mut input: InputSession<u64, (String, Millis), isize> = InputSession::new();
        let mut probe = ProbeHandle::new();
        let ranked: Rc<RefCell<Vec<TypedGroup>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = ranked.clone();
        let metrics_for_dataflow = metrics.clone();
        worker.dataflow::<u64, _, _>(|scope| {
            let events = input.to_collection(scope);

            // Each event lands in every sliding window containing its timestamp.
            let windowed = events.flat_map(move |(token, ts)| {
                let windows = spec.assign(ts);
                metrics_for_dataflow.inc_window_assignments(windows.len() as u64);
                windows
                    .into_iter()
                    .map(move |w| ((w.start_ms, token.clone()), ()))
                    .collect::<Vec<_>>()
            });

            let counts = windowed.reduce(|_key, inputs, output| {
                let total: isize = inputs.iter().map(|(_, diff)| *diff).sum();
                if total > 0 {
                    output.push((total as u64, 1isize));
                }
            });

            let top = counts
                .map(|((start, token), count)| {
                    // Exchanged keys stay primitive; the kind travels as its marker byte.
                    let marker = split(&token).marker() as u8;
                    ((start, marker), (token, count))
                })
                .reduce(move |_key, inputs, output| {
                    let group = inputs.iter().map(|(pair, _)| (*pair).clone());
                    output.push((select_top_k(group, k), 1isize));
                });

            top.inspect(move |((key, ranked), _time, diff)| {
                if *diff <= 0 {
                    return;
                }
                let (start, marker) = key;
                sink.borrow_mut().push(TypedGroup {
                    kind: EntityKind::of_marker(*marker as char),
                    window_start_ms: *start,
                    ranked: ranked.clone(),
                });
            })
            .probe_with(&mut probe);
        });

        let mut outcome: TrendResult<()> = Ok(());
        let mut fed = 0u64;
        for (idx, record) in records.iter().enumerate().skip(index).step_by(peers) {
            match record_events(idx, record, &settings, &metrics) {
                Ok(events) => {
                    for event in events {
                        input.insert((event.token, event.timestamp_ms));
                        fed += 1;
                    }
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        debug!(worker = index, events = fed, "input fed");

        // Close epoch 0 and drive the dataflow until every window is final.
        input.advance_to(1);
        input.flush();
        while probe.less_than(input.time()) {
            worker.step();
        }

        let groups = std::mem::take(&mut *ranked.borrow_mut());
        debug!(worker = index, groups = groups.len(), "worker finished");
        outcome.map(|()| groups)
    })?;

    let mut groups = Vec::new();
    for result in per_worker {
        groups.extend(result?);
    }
    groups.sort_by(|a, b| (a.window_start_ms, a.kind).cmp(&(b.window_start_ms, b.kind)));
    metrics.inc_groups_emitted(groups.len() as u64);
    info!(groups = groups.len(), workers, "dataflow complete");
    Ok(groups)
}
