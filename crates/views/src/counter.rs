use std::collections::HashMap;

use tracing::debug;
use tt_core::{EntityEvent, Millis, Window, WindowedCount};

use crate::window::WindowSpec;

/// Running per-(window, token) counts.
///
/// Counts are grouped by window so a window can be finalized and evicted as a whole once
/// a watermark proves no further event can land in it.
#[derive(Debug, Default)]
pub struct WindowCounter {
    windows: HashMap<Window, HashMap<String, u64>>,
    watermark: Option<Millis>,
    late: u64,
}

impl WindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `token` to `window`. Returns false if the window was
    /// already closed by [`drain_closed`](Self::drain_closed).
    pub fn observe(&mut self, token: &str, window: Window) -> bool {
        if self.is_closed(&window) {
            self.late += 1;
            return false;
        }
        let tokens = self.windows.entry(window).or_default();
        match tokens.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                tokens.insert(token.to_string(), 1);
            }
        }
        true
    }

    /// Assigns the event to all of its windows and counts it in each.
    /// Returns the number of windows it was counted in.
    pub fn observe_event(&mut self, event: &EntityEvent, spec: &WindowSpec) -> usize {
        spec.assign(event.timestamp_ms)
            .into_iter()
            .filter(|w| self.observe(&event.token, *w))
            .count()
    }

    pub fn count(&self, window: &Window, token: &str) -> u64 {
        self.windows
            .get(window)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or(0)
    }

    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Number of live (window, token) keys.
    pub fn len(&self) -> usize {
        self.windows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Occurrences rejected because their window had already been drained.
    pub fn late_events(&self) -> u64 {
        self.late
    }

    fn is_closed(&self, window: &Window) -> bool {
        matches!(self.watermark, Some(wm) if window.end_ms() <= wm)
    }

    /// Finalizes every window ending at or before `watermark` and evicts it.
    /// The batch engines never call this; they read everything through [`finish`](Self::finish).
    pub fn drain_closed(&mut self, watermark: Millis) -> Vec<WindowedCount> {
        self.watermark = Some(self.watermark.map_or(watermark, |wm| wm.max(watermark)));
        let closed: Vec<Window> = self
            .windows
            .keys()
            .filter(|w| w.end_ms() <= watermark)
            .copied()
            .collect();
        let mut out = Vec::new();
        for window in closed {
            if let Some(tokens) = self.windows.remove(&window) {
                debug!(window_start = window.start_ms, tokens = tokens.len(), "window closed");
                out.extend(flatten(window, tokens));
            }
        }
        out
    }

    /// Consumes the counter, returning every count. Only valid once all input is seen.
    pub fn finish(self) -> Vec<WindowedCount> {
        self.windows
            .into_iter()
            .flat_map(|(window, tokens)| flatten(window, tokens))
            .collect()
    }
}

fn flatten(window: Window, tokens: HashMap<String, u64>) -> impl Iterator<Item = WindowedCount> {
    tokens
        .into_iter()
        .map(move |(token, count)| WindowedCount { window, token, count })
}
