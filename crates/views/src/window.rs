use serde::{Deserialize, Serialize};
use tt_core::time::MILLIS_PER_MINUTE;
use tt_core::{EntityEvent, Millis, TrendError, TrendResult, Window};

/// Upper bound on `ceil(size / freq)`, the number of windows one event is counted in.
pub const MAX_WINDOWS_PER_EVENT: i64 = 10_000;

/// Sliding window geometry: every `freq_ms` a window of `size_ms` opens, aligned to the
/// Unix epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSpec {
    size_ms: Millis,
    freq_ms: Millis,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { size_ms: 30 * MILLIS_PER_MINUTE, freq_ms: 5 * MILLIS_PER_MINUTE }
    }
}

impl WindowSpec {
    pub fn new(size_ms: Millis, freq_ms: Millis) -> TrendResult<Self> {
        if size_ms <= 0 {
            return Err(TrendError::config(format!("window size must be positive, got {size_ms}ms")));
        }
        if freq_ms <= 0 {
            return Err(TrendError::config(format!(
                "window frequency must be positive, got {freq_ms}ms"
            )));
        }
        if freq_ms > size_ms {
            return Err(TrendError::config(format!(
                "window frequency ({freq_ms}ms) must not exceed window size ({size_ms}ms)"
            )));
        }
        let overlap = ceil_div(size_ms, freq_ms);
        if overlap > MAX_WINDOWS_PER_EVENT {
            return Err(TrendError::config(format!(
                "window size ({size_ms}ms) over frequency ({freq_ms}ms) puts each event in \
                 {overlap} windows, more than {MAX_WINDOWS_PER_EVENT}"
            )));
        }
        Ok(Self { size_ms, freq_ms })
    }

    pub fn from_minutes(size: i64, freq: i64) -> TrendResult<Self> {
        let to_ms = |minutes: i64, name: &str| {
            minutes.checked_mul(MILLIS_PER_MINUTE).ok_or_else(|| {
                TrendError::config(format!("window {name} of {minutes} minutes is out of range"))
            })
        };
        Self::new(to_ms(size, "size")?, to_ms(freq, "frequency")?)
    }

    pub fn size_ms(&self) -> Millis {
        self.size_ms
    }

    pub fn freq_ms(&self) -> Millis {
        self.freq_ms
    }

    /// `ceil(size / freq)`: how many windows hold any one instant.
    pub fn windows_per_event(&self) -> usize {
        ceil_div(self.size_ms, self.freq_ms) as usize
    }

    pub fn window_at(&self, start_ms: Millis) -> Window {
        Window::new(start_ms, self.size_ms)
    }

    /// Every window with `start <= timestamp < start + size` and `start` a multiple of the
    /// frequency, earliest first.
    pub fn assign(&self, timestamp_ms: Millis) -> Vec<Window> {
        // No representable start at or before the earliest instants.
        let Some(last_start) = timestamp_ms.checked_sub(timestamp_ms.rem_euclid(self.freq_ms)) else {
            return Vec::new();
        };
        let mut windows = Vec::with_capacity(self.windows_per_event());
        let earliest_excluded = timestamp_ms.saturating_sub(self.size_ms);
        let mut next = Some(last_start);
        while let Some(start) = next.filter(|s| *s > earliest_excluded) {
            windows.push(self.window_at(start));
            next = start.checked_sub(self.freq_ms);
        }
        windows.reverse();
        windows
    }
}

// Both operands positive.
fn ceil_div(a: i64, b: i64) -> i64 {
    a / b + i64::from(a % b != 0)
}

pub fn assign_windows(event: &EntityEvent, spec: &WindowSpec) -> Vec<Window> {
    spec.assign(event.timestamp_ms)
}
