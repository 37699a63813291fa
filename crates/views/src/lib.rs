//! Reusable view builders: sliding windows, windowed counts, type split, top-K, output lines.

use serde::{Deserialize, Serialize};
use tt_core::{TypedGroup, WindowedCount};

pub mod counter;
pub mod format;
pub mod split;
pub mod topk;
pub mod window;

pub use counter::WindowCounter;
pub use format::{format_group, format_line, parse_line, DELIMITER};
pub use split::{group_by_kind, split};
pub use topk::{rank_order, select_top_k};
pub use window::{assign_windows, WindowSpec};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopKConfig {
    pub k: usize,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self { k: 10 }
    }
}

/// Splits final counts by (window, kind) and keeps the top `k` of each group.
/// Groups come back ordered by window start, mentions before hashtags.
pub fn rank_groups<I>(counts: I, cfg: TopKConfig) -> Vec<TypedGroup>
where
    I: IntoIterator<Item = WindowedCount>,
{
    group_by_kind(counts)
        .into_iter()
        .map(|((window_start_ms, kind), tokens)| TypedGroup {
            kind,
            window_start_ms,
            ranked: select_top_k(tokens, cfg.k),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_core::{EntityKind, Window};

    fn wc(start: i64, token: &str, count: u64) -> WindowedCount {
        WindowedCount { window: Window::new(start, 10), token: token.to_string(), count }
    }

    #[test]
    fn ranks_each_kind_and_window_separately() {
        let counts = vec![
            wc(0, "@bob", 5),
            wc(0, "#go", 3),
            wc(0, "@amy", 1),
            wc(10, "#go", 2),
        ];
        let groups = rank_groups(counts, TopKConfig { k: 1 });
        assert_eq!(
            groups,
            vec![
                TypedGroup { kind: EntityKind::Mention, window_start_ms: 0, ranked: vec![("@bob".into(), 5)] },
                TypedGroup { kind: EntityKind::Hashtag, window_start_ms: 0, ranked: vec![("#go".into(), 3)] },
                TypedGroup { kind: EntityKind::Hashtag, window_start_ms: 10, ranked: vec![("#go".into(), 2)] },
            ]
        );
    }
}
