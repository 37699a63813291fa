use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Run counters, cheap to clone and shared by every worker.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    records_read: AtomicU64,
    records_rejected: AtomicU64,
    records_skipped: AtomicU64,
    entities_extracted: AtomicU64,
    entities_dropped: AtomicU64,
    window_assignments: AtomicU64,
    groups_emitted: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_records_read(&self, delta: u64) {
        self.inner.records_read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_records_rejected(&self, delta: u64) {
        self.inner.records_rejected.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_records_skipped(&self, delta: u64) {
        self.inner.records_skipped.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_entities_extracted(&self, delta: u64) {
        self.inner.entities_extracted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_entities_dropped(&self, delta: u64) {
        self.inner.entities_dropped.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_window_assignments(&self, delta: u64) {
        self.inner.window_assignments.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_groups_emitted(&self, delta: u64) {
        self.inner.groups_emitted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.inner.records_read.load(Ordering::Relaxed),
            records_rejected: self.inner.records_rejected.load(Ordering::Relaxed),
            records_skipped: self.inner.records_skipped.load(Ordering::Relaxed),
            entities_extracted: self.inner.entities_extracted.load(Ordering::Relaxed),
            entities_dropped: self.inner.entities_dropped.load(Ordering::Relaxed),
            window_assignments: self.inner.window_assignments.load(Ordering::Relaxed),
            groups_emitted: self.inner.groups_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub records_rejected: u64,
    pub records_skipped: u64,
    pub entities_extracted: u64,
    pub entities_dropped: u64,
    pub window_assignments: u64,
    pub groups_emitted: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counts: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counts: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct StageTimer {
    start: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsRegistry::default();
        let other = metrics.clone();
        metrics.inc_records_read(3);
        other.inc_records_read(2);
        other.inc_groups_emitted(1);
        let snap = metrics.snapshot();
        assert_eq!(snap.records_read, 5);
        assert_eq!(snap.groups_emitted, 1);
    }

    #[test]
    fn json_line_is_flat() {
        let metrics = MetricsRegistry::default();
        metrics.inc_entities_extracted(7);
        let line = metrics
            .snapshot()
            .to_json_line("run", Some(Duration::from_millis(12)));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["label"], "run");
        assert_eq!(value["entities_extracted"], 7);
        assert_eq!(value["elapsed_ms"], 12);
    }
}
