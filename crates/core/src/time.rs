//! Instant parsing and rendering at the millisecond resolution used throughout.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::{Millis, TrendError, TrendResult};

pub const MILLIS_PER_MINUTE: Millis = 60_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 instant. Offsets are honoured; a bare date-time is taken as UTC,
/// a bare date as its midnight UTC, and seconds may be left out.
pub fn parse_instant(raw: &str) -> TrendResult<Millis> {
    let raw = raw.trim();
    if let Some(ms) = parse_date_time(raw) {
        return Ok(ms);
    }
    if let Some(ms) = with_seconds(raw).and_then(|full| parse_date_time(&full)) {
        return Ok(ms);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight).timestamp_millis());
        }
    }
    Err(TrendError::config(format!("cannot parse timestamp {raw:?} as ISO-8601")))
}

fn parse_date_time(raw: &str) -> Option<Millis> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
    })
}

/// `YYYY-MM-DDTHH:MM[offset]` becomes `YYYY-MM-DDTHH:MM:00[offset]`.
fn with_seconds(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let minute_precision = bytes.len() >= 16
        && bytes[13] == b':'
        && bytes.get(16) != Some(&b':')
        && raw.is_char_boundary(16);
    minute_precision.then(|| format!("{}:00{}", &raw[..16], &raw[16..]))
}

/// Renders epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_instant(ms: Millis) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}

/// Inverse of [`format_instant`]; also accepts a plain millisecond integer.
pub fn parse_rendered_instant(raw: &str) -> TrendResult<Millis> {
    if let Ok(ms) = raw.parse::<Millis>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| TrendError::parse(format!("invalid window start {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_utc() {
        assert_eq!(parse_instant("1970-01-01T00:00:01Z").unwrap(), 1_000);
        assert_eq!(parse_instant("1970-01-01T01:00:00+01:00").unwrap(), 0);
        assert_eq!(parse_instant("1970-01-01T00:01:00").unwrap(), MILLIS_PER_MINUTE);
        assert_eq!(parse_instant("1970-01-01T00:00:00.250").unwrap(), 250);
    }

    #[test]
    fn parses_shorter_iso_forms() {
        let new_year = 1_451_606_400_000;
        assert_eq!(parse_instant("2016-01-01").unwrap(), new_year);
        assert_eq!(parse_instant("2016-01-01T00:00").unwrap(), new_year);
        assert_eq!(parse_instant("2016-01-01T00:00Z").unwrap(), new_year);
        assert_eq!(parse_instant("2016-01-01T01:00+01:00").unwrap(), new_year);
        assert_eq!(parse_instant("2016-01-01T00:05Z").unwrap(), new_year + 5 * MILLIS_PER_MINUTE);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_instant("yesterday").unwrap_err();
        assert!(matches!(err, TrendError::Configuration(_)));
        assert!(parse_instant("2016-13-01").is_err());
        assert!(parse_instant("2016-01-01T25:00Z").is_err());
    }

    #[test]
    fn rendered_instants_parse_back() {
        let ms = 1_451_606_700_000;
        let rendered = format_instant(ms);
        assert_eq!(rendered, "2016-01-01T00:05:00.000Z");
        assert_eq!(parse_rendered_instant(&rendered).unwrap(), ms);
    }
}
