//! Structured-format comment extraction.
//!
//! The comments document is an array of objects carrying the source-assigned
//! `commentId`, the owning `videoId`/`channelId`, a timestamp, and the
//! comment body as a segmented payload. A comment that mentions another user
//! is split into a leading mention segment and a trailing authored-text
//! segment; only the last segment is the user's actual content.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::models::{Comment, Extracted};
use crate::timefmt::CanonicalTimestamp;

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(rename = "commentId")]
    comment_id: Option<String>,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    #[serde(rename = "time", alias = "timestamp")]
    time: Option<String>,
    #[serde(rename = "contentPayload", alias = "text")]
    payload: Option<Value>,
}

/// Takes the final authored segment from a comment payload.
///
/// Accepted shapes: a bare segment array, an object with a
/// `takeoutSegments` array, or a plain string. Leading segments are
/// mention/reference artifacts and are dropped; payloads with more than two
/// segments follow the same last-segment rule (see DESIGN.md).
pub fn payload_text(payload: &Value) -> Result<String> {
    let segments = match payload {
        Value::String(s) => return Ok(s.clone()),
        Value::Array(seq) => seq.as_slice(),
        Value::Object(map) => map
            .get("takeoutSegments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ExtractError::PayloadMalformed("object without takeoutSegments".to_string())
            })?,
        other => {
            return Err(ExtractError::PayloadMalformed(format!(
                "unexpected payload shape: {other}"
            )))
        }
    };

    let last = segments
        .last()
        .ok_or_else(|| ExtractError::PayloadMalformed("empty segment list".to_string()))?;
    last.get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ExtractError::PayloadMalformed("segment without text".to_string()))
}

/// Extracts comments from a structured comments document, chronologically
/// ordered. Comments with malformed payloads or timestamps are skipped.
pub fn extract(document: &str) -> Result<Extracted<Comment>> {
    let raw: Vec<RawComment> = serde_json::from_str(document)
        .map_err(|e| ExtractError::FormatMismatch(format!("comments JSON: {e}")))?;

    let mut out = Extracted::default();
    for entry in raw {
        let text = match entry.payload.as_ref().map(payload_text) {
            Some(Ok(text)) => text,
            Some(Err(err)) => {
                debug!(comment_id = ?entry.comment_id, %err, "skipping comment");
                out.skipped += 1;
                continue;
            }
            None => {
                debug!(comment_id = ?entry.comment_id, "skipping comment without payload");
                out.skipped += 1;
                continue;
            }
        };

        let timestamp = match entry.time.as_deref().map(CanonicalTimestamp::parse) {
            Some(Ok(ts)) => ts,
            _ => {
                debug!(comment_id = ?entry.comment_id, "skipping comment without valid time");
                out.skipped += 1;
                continue;
            }
        };

        out.records.push(Comment {
            comment_id: entry.comment_id,
            video_id: entry.video_id,
            channel_id: entry.channel_id,
            text,
            timestamp,
        });
    }

    out.records.sort_by_key(|c| c.timestamp.epoch_seconds());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mention_segment_is_dropped() {
        let payload = json!([{"text": "+Alice "}, {"text": "nice video!"}]);
        assert_eq!(payload_text(&payload).unwrap(), "nice video!");
    }

    #[test]
    fn single_segment_is_taken_whole() {
        let payload = json!({"takeoutSegments": [{"text": "just a comment"}]});
        assert_eq!(payload_text(&payload).unwrap(), "just a comment");
    }

    #[test]
    fn empty_payload_is_malformed() {
        let err = payload_text(&json!([])).unwrap_err();
        assert!(matches!(err, ExtractError::PayloadMalformed(_)));
    }

    #[test]
    fn extracts_and_skips_per_entry() {
        let doc = r#"[
            {"commentId": "c1", "videoId": "v1", "channelId": "ch1",
             "time": "2024-03-05T14:30:00Z",
             "contentPayload": {"takeoutSegments": [{"text": "+Alice "}, {"text": "nice video!"}]}},
            {"commentId": "c2", "videoId": "v2",
             "time": "2024-03-06T10:00:00Z",
             "contentPayload": {"takeoutSegments": []}}
        ]"#;
        let out = extract(doc).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].text, "nice video!");
        assert_eq!(out.records[0].comment_id.as_deref(), Some("c1"));
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn whole_file_mismatch_is_an_error() {
        let err = extract("not json").unwrap_err();
        assert!(matches!(err, ExtractError::FormatMismatch(_)));
    }
}
