//! Record-level stages: post filtering, entity extraction and entity allow/deny lists.
//!
//! Everything here is a pure function of one record (or one token) and an immutable
//! configuration value, so callers may shard input across any number of workers.

pub mod entity;
pub mod extract;
pub mod record;

pub use entity::{EntityFilter, FilterMode};
pub use extract::{extract, extract_post};
pub use record::RecordFilter;

/// Splits a comma-separated option into trimmed, lowercased, non-empty needles.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
