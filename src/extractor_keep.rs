//! Keep note extraction.
//!
//! Keep exports one JSON document per note under the `Keep/` directory.
//! Each document carries the note body (plain text or a checklist), display
//! metadata, lifecycle flags, and microsecond epoch timestamps. The
//! filename stem doubles as the source-assigned note id.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ExtractError, Result};
use crate::models::{Extracted, Note, NoteListItem};
use crate::timefmt::CanonicalTimestamp;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNote {
    #[serde(default)]
    title: String,
    text_content: Option<String>,
    #[serde(default)]
    list_content: Vec<RawListItem>,
    color: Option<String>,
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
    #[serde(default)]
    is_trashed: bool,
    #[serde(default)]
    is_pinned: bool,
    #[serde(default)]
    is_archived: bool,
    created_timestamp_usec: Option<i64>,
    user_edited_timestamp_usec: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListItem {
    #[serde(default)]
    text: String,
    #[serde(default)]
    is_checked: bool,
}

/// Parses one per-note document.
pub fn extract_note(document: &str, source_id: Option<String>) -> Result<Note> {
    let raw: RawNote = serde_json::from_str(document)
        .map_err(|e| ExtractError::FormatMismatch(format!("note JSON: {e}")))?;

    let created_usec = raw
        .created_timestamp_usec
        .ok_or(ExtractError::FieldMissing("createdTimestampUsec"))?;
    let created_time = CanonicalTimestamp::from_epoch_micros(created_usec)?;
    let updated_time = match raw.user_edited_timestamp_usec {
        Some(usec) => CanonicalTimestamp::from_epoch_micros(usec)?,
        None => created_time,
    };

    Ok(Note {
        source_id,
        title: raw.title,
        created_time,
        updated_time,
        text_content: raw.text_content,
        list_content: raw
            .list_content
            .into_iter()
            .map(|item| NoteListItem {
                text: item.text,
                is_checked: item.is_checked,
            })
            .collect(),
        color: raw.color,
        annotations: raw.annotations,
        is_trashed: raw.is_trashed,
        is_pinned: raw.is_pinned,
        is_archived: raw.is_archived,
    })
}

/// Walks the Keep directory and extracts every `.json` note file. A note
/// that fails to parse is skipped; the walk continues.
pub fn extract_dir(dir: &Path) -> Result<Extracted<Note>> {
    if !dir.is_dir() {
        return Err(ExtractError::FormatMismatch(format!(
            "not a notes directory: {}",
            dir.display()
        )));
    }

    let mut out = Extracted::default();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }

        let source_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        let document = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %path.display(), %err, "skipping unreadable note file");
                out.skipped += 1;
                continue;
            }
        };

        match extract_note(&document, source_id) {
            Ok(note) => out.records.push(note),
            Err(err) => {
                debug!(path = %path.display(), %err, "skipping malformed note file");
                out.skipped += 1;
            }
        }
    }

    out.records
        .sort_by_key(|n| (n.created_time.epoch_seconds(), n.title.clone()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = r#"{
        "title": "Groceries",
        "listContent": [
            {"text": "eggs", "isChecked": true},
            {"text": "flour", "isChecked": false}
        ],
        "color": "DEFAULT",
        "isTrashed": false,
        "isPinned": true,
        "isArchived": false,
        "createdTimestampUsec": 1709649000000000,
        "userEditedTimestampUsec": 1709735400000000
    }"#;

    #[test]
    fn parses_checklist_note() {
        let note = extract_note(NOTE, Some("Groceries".to_string())).unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.list_content.len(), 2);
        assert!(note.list_content[0].is_checked);
        assert!(note.is_pinned);
        assert_eq!(note.created_time.to_string(), "05 Mar 2024, 14:30:00 GMT+00:00");
        assert_eq!(note.updated_time.to_string(), "06 Mar 2024, 14:30:00 GMT+00:00");
    }

    #[test]
    fn missing_created_time_is_field_missing() {
        let err = extract_note(r#"{"title": "x"}"#, None).unwrap_err();
        assert!(matches!(err, ExtractError::FieldMissing(_)));
    }

    #[test]
    fn dir_walk_skips_malformed_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.json"), NOTE).unwrap();
        std::fs::write(tmp.path().join("b.json"), "not json").unwrap();
        std::fs::write(tmp.path().join("c.png"), [0u8; 4]).unwrap();

        let out = extract_dir(tmp.path()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].source_id.as_deref(), Some("a"));
        assert_eq!(out.skipped, 1);
    }
}
