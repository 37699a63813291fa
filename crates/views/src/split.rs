use std::collections::BTreeMap;

use tt_core::{EntityKind, Millis, WindowedCount};

pub fn split(token: &str) -> EntityKind {
    EntityKind::of_token(token)
}

/// Partitions counts into (window start, kind) groups of `(token, count)`.
pub fn group_by_kind<I>(counts: I) -> BTreeMap<(Millis, EntityKind), Vec<(String, u64)>>
where
    I: IntoIterator<Item = WindowedCount>,
{
    let mut groups: BTreeMap<(Millis, EntityKind), Vec<(String, u64)>> = BTreeMap::new();
    for WindowedCount { window, token, count } in counts {
        groups
            .entry((window.start_ms, split(&token)))
            .or_default()
            .push((token, count));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_core::Window;

    #[test]
    fn split_uses_leading_marker() {
        assert_eq!(split("@bob"), EntityKind::Mention);
        assert_eq!(split("#go"), EntityKind::Hashtag);
    }

    #[test]
    fn groups_by_window_and_kind() {
        let w = Window::new(0, 5);
        let counts = vec![
            WindowedCount { window: w, token: "@a".into(), count: 1 },
            WindowedCount { window: w, token: "#b".into(), count: 2 },
            WindowedCount { window: w, token: "@c".into(), count: 3 },
        ];
        let groups = group_by_kind(counts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&(0, EntityKind::Mention)].len(), 2);
        assert_eq!(groups[&(0, EntityKind::Hashtag)], vec![("#b".to_string(), 2)]);
    }
}
