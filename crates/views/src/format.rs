//! Output lines: `type,windowStart,token1,count1,token2,count2,...`.
//!
//! Tokens are written as-is; one that contains the delimiter will not parse back.

use tt_core::time::{format_instant, parse_rendered_instant};
use tt_core::{EntityKind, Millis, TrendError, TrendResult, TypedGroup};

pub const DELIMITER: char = ',';

pub fn format_line(kind: EntityKind, window_start_ms: Millis, ranked: &[(String, u64)]) -> String {
    let mut line = String::new();
    line.push_str(kind.label());
    line.push(DELIMITER);
    line.push_str(&format_instant(window_start_ms));
    for (token, count) in ranked {
        line.push(DELIMITER);
        line.push_str(token);
        line.push(DELIMITER);
        line.push_str(&count.to_string());
    }
    line
}

pub fn format_group(group: &TypedGroup) -> String {
    format_line(group.kind, group.window_start_ms, &group.ranked)
}

pub fn parse_line(line: &str) -> TrendResult<TypedGroup> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(DELIMITER);
    let label = fields.next().unwrap_or_default();
    let kind = EntityKind::from_label(label)
        .ok_or_else(|| TrendError::parse(format!("unknown entity type {label:?}")))?;
    let start = fields
        .next()
        .ok_or_else(|| TrendError::parse("missing window start"))?;
    let window_start_ms = parse_rendered_instant(start)?;

    let rest: Vec<&str> = fields.collect();
    if rest.len() % 2 != 0 {
        return Err(TrendError::parse("unpaired token/count field"));
    }
    let ranked = rest
        .chunks(2)
        .map(|pair| {
            let count = pair[1]
                .parse::<u64>()
                .map_err(|e| TrendError::parse(format!("invalid count {:?}: {e}", pair[1])))?;
            Ok((pair[0].to_string(), count))
        })
        .collect::<TrendResult<Vec<_>>>()?;

    Ok(TypedGroup { kind, window_start_ms, ranked })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_type_start_and_pairs() {
        let ranked = vec![("@bob".to_string(), 5), ("@amy".to_string(), 2)];
        assert_eq!(
            format_line(EntityKind::Mention, 0, &ranked),
            "mention,1970-01-01T00:00:00.000Z,@bob,5,@amy,2"
        );
        assert_eq!(format_line(EntityKind::Hashtag, 0, &[]), "hashtag,1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn parses_back_what_it_wrote() {
        let group = TypedGroup {
            kind: EntityKind::Hashtag,
            window_start_ms: 1_451_606_700_000,
            ranked: vec![("#go".into(), 3), ("#rust".into(), 1)],
        };
        assert_eq!(parse_line(&format_group(&group)).unwrap(), group);
    }

    #[test]
    fn delimiter_in_token_breaks_the_round_trip() {
        let group = TypedGroup {
            kind: EntityKind::Hashtag,
            window_start_ms: 0,
            ranked: vec![("#a,b".into(), 3)],
        };
        assert!(parse_line(&format_group(&group)).is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(parse_line("emoji,0,:),1").unwrap_err().is_parse());
    }
}
