//! Structured-format (JSON) activity extraction.
//!
//! The structured-era export is an array of activity objects. It is more
//! complete than the markup rendering (explicit ad attribution, stable
//! field names) so extraction is mostly field mapping, but the ad filter
//! must mirror the markup heuristic so both formats materialize the same
//! record set.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::models::{ActivityEvent, ActivityKind, Extracted};
use crate::timefmt::CanonicalTimestamp;

/// `details[0].name` value that marks an ad-attributed entry.
pub const AD_DETAILS_NAME: &str = "From Google Ads";

#[derive(Debug, Deserialize)]
struct RawActivity {
    title: Option<String>,
    #[serde(rename = "titleUrl")]
    title_url: Option<String>,
    time: Option<String>,
    description: Option<String>,
    #[serde(default)]
    details: Vec<Value>,
    #[serde(default)]
    products: Vec<String>,
}

/// Ad heuristic for the structured format, kept behind one predicate so a
/// future export vintage can swap it without touching extraction.
fn is_advertisement(entry: &RawActivity) -> bool {
    entry
        .details
        .first()
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        == Some(AD_DETAILS_NAME)
}

/// Extracts events from a structured activity document, chronologically
/// ordered. Entries that are ad-attributed or missing required fields are
/// skipped, never fatal.
pub fn extract(document: &str, kind: ActivityKind) -> Result<Extracted<ActivityEvent>> {
    let raw: Vec<RawActivity> = serde_json::from_str(document)
        .map_err(|e| ExtractError::FormatMismatch(format!("activity JSON: {e}")))?;

    let mut out = Extracted::default();
    for entry in raw {
        if is_advertisement(&entry) {
            debug!(kind = kind.label(), "discarding ad-attributed entry");
            out.skipped += 1;
            continue;
        }

        let Some(title) = entry.title else {
            debug!(kind = kind.label(), "skipping entry without title");
            out.skipped += 1;
            continue;
        };

        // Watched videos can lose their URL (removed uploads); a search
        // without one is malformed.
        if kind == ActivityKind::Search && entry.title_url.is_none() {
            debug!(kind = kind.label(), %title, "skipping search entry without URL");
            out.skipped += 1;
            continue;
        }

        let timestamp = match entry.time.as_deref().map(CanonicalTimestamp::parse) {
            Some(Ok(ts)) => ts,
            Some(Err(err)) => {
                debug!(kind = kind.label(), %title, %err, "skipping entry with unparseable time");
                out.skipped += 1;
                continue;
            }
            None => {
                debug!(kind = kind.label(), %title, "skipping entry without time");
                out.skipped += 1;
                continue;
            }
        };

        // Detail objects are not reshaped; the viewer gets what the export
        // wrote.
        let (description, details, products) = match kind {
            ActivityKind::Watch => (entry.description, entry.details, entry.products),
            ActivityKind::Search => (None, vec![], vec![]),
        };

        out.records.push(ActivityEvent {
            title,
            link: entry.title_url,
            timestamp,
            description,
            details,
            products,
        });
    }

    out.records.sort_by_key(|e| e.timestamp.epoch_seconds());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_watch_entries_with_passthrough() {
        let doc = r#"[
            {"title": "Watched Ferris at Work",
             "titleUrl": "https://www.youtube.com/watch?v=abc",
             "time": "2024-03-05T14:30:00Z",
             "description": "A crab types",
             "products": ["YouTube"]},
            {"title": "Watched a removed video",
             "time": "2024-03-06T10:00:00Z"}
        ]"#;
        let out = extract(doc, ActivityKind::Watch).unwrap();
        assert_eq!(out.skipped, 0);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].description.as_deref(), Some("A crab types"));
        assert_eq!(out.records[0].products, ["YouTube"]);
        assert!(out.records[1].link.is_none());
    }

    #[test]
    fn ad_attributed_entries_are_dropped() {
        let doc = r#"[
            {"title": "Watched Sponsored thing",
             "titleUrl": "https://y/ad",
             "time": "2024-03-05T14:30:00Z",
             "details": [{"name": "From Google Ads"}]},
            {"title": "Watched Real thing",
             "titleUrl": "https://y/real",
             "time": "2024-03-05T15:00:00Z"}
        ]"#;
        let out = extract(doc, ActivityKind::Watch).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].title, "Watched Real thing");
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn detail_objects_pass_through_verbatim() {
        let doc = r#"[
            {"title": "Watched Clip",
             "titleUrl": "https://y/x",
             "time": "2024-03-05T14:30:00Z",
             "details": [{"name": "From partner program", "sourceIds": ["p1"]}]}
        ]"#;
        let out = extract(doc, ActivityKind::Watch).unwrap();
        let detail = &out.records[0].details[0];
        assert_eq!(detail["name"], "From partner program");
        assert_eq!(detail["sourceIds"][0], "p1");
    }

    #[test]
    fn missing_title_skips_only_that_entry() {
        let doc = r#"[
            {"titleUrl": "https://y/x", "time": "2024-03-05T14:30:00Z"},
            {"title": "Watched Fine", "time": "2024-03-05T15:00:00Z"}
        ]"#;
        let out = extract(doc, ActivityKind::Watch).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn search_requires_url() {
        let doc = r#"[
            {"title": "Searched for rust", "time": "2024-03-05T14:30:00Z"},
            {"title": "Searched for crabs",
             "titleUrl": "https://y/results?q=crabs",
             "time": "2024-03-05T15:00:00Z"}
        ]"#;
        let out = extract(doc, ActivityKind::Search).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].title, "Searched for crabs");
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn whole_file_mismatch_is_an_error() {
        let err = extract("{\"not\": \"an array\"}", ActivityKind::Watch).unwrap_err();
        assert!(matches!(err, ExtractError::FormatMismatch(_)));
    }

    #[test]
    fn output_is_sorted_by_time() {
        let doc = r#"[
            {"title": "Second", "titleUrl": "https://y/2", "time": "2024-03-06T10:00:00Z"},
            {"title": "First", "titleUrl": "https://y/1", "time": "2024-03-05T10:00:00Z"}
        ]"#;
        let out = extract(doc, ActivityKind::Watch).unwrap();
        let titles: Vec<_> = out.records.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
    }
}
