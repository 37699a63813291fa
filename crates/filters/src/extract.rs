use tt_core::{EntityEvent, EntityKind, Post, RawRecord, TrendResult};

/// Mentions first, then hashtags, each in post order.
pub fn extract(record: &RawRecord) -> TrendResult<Vec<EntityEvent>> {
    let post = record.parse_post()?;
    Ok(extract_post(&post))
}

pub fn extract_post(post: &Post) -> Vec<EntityEvent> {
    let ts = post.timestamp_ms;
    let mentions = post
        .entities
        .user_mentions
        .iter()
        .map(|m| EntityEvent::new(EntityKind::Mention, &m.screen_name, ts));
    let hashtags = post
        .entities
        .hashtags
        .iter()
        .map(|h| EntityEvent::new(EntityKind::Hashtag, &h.text, ts));
    mentions.chain(hashtags).collect()
}
