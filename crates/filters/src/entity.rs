use serde::{Deserialize, Serialize};
use tt_core::{HASHTAG_MARKER, MENTION_MARKER};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep only listed entities.
    Include,
    /// Drop listed entities.
    Exclude,
}

/// Allow/deny list over extracted tokens.
///
/// A list entry matches a token when it equals the whole token (`@bob`) or the token
/// without its marker (`bob`), ignoring case. A bare name therefore matches both the
/// mention and the hashtag of that name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityFilter {
    list: Option<Vec<String>>,
    mode: FilterMode,
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::unset()
    }
}

impl EntityFilter {
    pub fn unset() -> Self {
        Self { list: None, mode: FilterMode::Exclude }
    }

    pub fn new<I, S>(list: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = list.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
        Self { list: Some(list), mode }
    }

    pub fn exclude<I, S>(list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(list, FilterMode::Exclude)
    }

    pub fn is_set(&self) -> bool {
        self.list.is_some()
    }

    pub fn include(&self, token: &str) -> bool {
        let Some(list) = &self.list else {
            return true;
        };
        let found = list.iter().any(|entry| matches_entry(token, entry));
        match self.mode {
            FilterMode::Include => found,
            FilterMode::Exclude => !found,
        }
    }
}

fn matches_entry(token: &str, entry: &str) -> bool {
    let token = token.to_lowercase();
    if token == entry {
        return true;
    }
    // A marked entry only matches its own kind.
    if entry.starts_with([MENTION_MARKER, HASHTAG_MARKER]) {
        return false;
    }
    token.trim_start_matches([MENTION_MARKER, HASHTAG_MARKER]) == entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_list_keeps_everything() {
        let filter = EntityFilter::unset();
        assert!(filter.include("@bob"));
        assert!(filter.include("#go"));
    }

    #[test]
    fn exclude_drops_bare_names_of_either_kind() {
        let filter = EntityFilter::exclude(["bob"]);
        assert!(!filter.include("@bob"));
        assert!(!filter.include("#bob"));
        assert!(filter.include("@alice"));
    }

    #[test]
    fn marked_entries_match_only_their_kind() {
        let filter = EntityFilter::exclude(["@Bob"]);
        assert!(!filter.include("@bob"));
        assert!(filter.include("#bob"));
    }

    #[test]
    fn include_mode_keeps_only_listed() {
        let filter = EntityFilter::new(["#rust", "nasa"], FilterMode::Include);
        assert!(filter.include("#rust"));
        assert!(filter.include("@NASA"));
        assert!(!filter.include("@rust"));
        assert!(!filter.include("#go"));
    }
}
