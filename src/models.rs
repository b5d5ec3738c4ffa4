//! Canonical record types produced by the extractors.
//!
//! These are the format-independent shapes that every source variant (markup
//! or structured) normalizes into. Each record carries a natural identity
//! key, hashed with SHA-256, which the store uses to collapse re-ingested
//! and cross-format duplicates.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::timefmt::CanonicalTimestamp;

/// Which activity stream an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Watch,
    Search,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Watch => "watch",
            ActivityKind::Search => "search",
        }
    }
}

/// The four stored record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Watch,
    Search,
    Comments,
    Notes,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Watch,
        Category::Search,
        Category::Comments,
        Category::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Watch => "watch",
            Category::Search => "search",
            Category::Comments => "comments",
            Category::Notes => "notes",
        }
    }
}

/// One normalized playback or search event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEvent {
    pub title: String,
    /// Absent for removed or otherwise unresolvable videos.
    pub link: Option<String>,
    pub timestamp: CanonicalTimestamp,
    /// Structured-format passthrough, empty for markup-format sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Detail objects carried through verbatim, not just their names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,
}

impl ActivityEvent {
    /// Identity key: `(kind, title, link, timestamp)`. The passthrough
    /// fields are excluded so that markup- and structured-format renderings
    /// of the same event collapse to one record.
    pub fn identity_hash(&self, kind: ActivityKind) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.label().as_bytes());
        hash_part(&mut hasher, Some(&self.title));
        hash_part(&mut hasher, self.link.as_deref());
        hash_part(&mut hasher, Some(&self.timestamp.to_string()));
        format!("{:x}", hasher.finalize())
    }
}

/// One user-authored YouTube comment, final revision only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Source-assigned stable id, when the format carries one.
    pub comment_id: Option<String>,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub text: String,
    pub timestamp: CanonicalTimestamp,
}

impl Comment {
    /// Identity key: the source-assigned comment id, falling back to the
    /// full tuple when the source format lacks one.
    pub fn identity_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"comment");
        match &self.comment_id {
            Some(id) => hash_part(&mut hasher, Some(id)),
            None => {
                hash_part(&mut hasher, self.video_id.as_deref());
                hash_part(&mut hasher, self.channel_id.as_deref());
                hash_part(&mut hasher, Some(&self.text));
                hash_part(&mut hasher, Some(&self.timestamp.to_string()));
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// One checklist entry of a Keep note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteListItem {
    pub text: String,
    pub is_checked: bool,
}

/// One normalized Keep note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Filename stem of the source file, when ingested from a per-note file.
    pub source_id: Option<String>,
    pub title: String,
    pub created_time: CanonicalTimestamp,
    pub updated_time: CanonicalTimestamp,
    pub text_content: Option<String>,
    pub list_content: Vec<NoteListItem>,
    pub color: Option<String>,
    /// Attached metadata (weblinks etc.), passed through verbatim.
    pub annotations: Vec<serde_json::Value>,
    pub is_trashed: bool,
    pub is_pinned: bool,
    pub is_archived: bool,
}

impl Note {
    /// Identity key: the source-assigned note id when present, else
    /// `(title, created_time)`.
    pub fn identity_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"note");
        match &self.source_id {
            Some(id) => hash_part(&mut hasher, Some(id)),
            None => {
                hash_part(&mut hasher, Some(&self.title));
                hash_part(&mut hasher, Some(&self.created_time.to_string()));
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

fn hash_part(hasher: &mut Sha256, part: Option<&str>) {
    // Presence marker keeps `None` distinct from `Some("")`.
    match part {
        Some(s) => {
            hasher.update([1]);
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        None => hasher.update([0]),
    }
}

/// Extraction result for one source file: the surviving records plus the
/// number of entries skipped (malformed or advertisement).
#[derive(Debug)]
pub struct Extracted<T> {
    pub records: Vec<T>,
    pub skipped: u64,
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// The six recognized source files of an export, resolved once per file and
/// matched exhaustively by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFile {
    MarkupWatch,
    MarkupSearch,
    StructuredWatch,
    StructuredSearch,
    StructuredComments,
    StructuredNotes,
}

impl SourceFile {
    pub const ALL: [SourceFile; 6] = [
        SourceFile::MarkupWatch,
        SourceFile::MarkupSearch,
        SourceFile::StructuredWatch,
        SourceFile::StructuredSearch,
        SourceFile::StructuredComments,
        SourceFile::StructuredNotes,
    ];

    /// Conventional relative paths, probed under both `<root>/` and
    /// `<root>/Takeout/`. `StructuredNotes` resolves to a directory of
    /// per-note files rather than a single document.
    pub fn candidate_paths(&self) -> &'static [&'static str] {
        match self {
            SourceFile::MarkupWatch => &["YouTube and YouTube Music/history/watch-history.html"],
            SourceFile::MarkupSearch => &["YouTube and YouTube Music/history/search-history.html"],
            SourceFile::StructuredWatch => &["YouTube and YouTube Music/history/watch-history.json"],
            SourceFile::StructuredSearch => {
                &["YouTube and YouTube Music/history/search-history.json"]
            }
            SourceFile::StructuredComments => &[
                "YouTube and YouTube Music/comments/comments.json",
                "YouTube and YouTube Music/my-comments/my-comments.json",
            ],
            SourceFile::StructuredNotes => &["Keep"],
        }
    }

    pub fn category(&self) -> Category {
        match self {
            SourceFile::MarkupWatch | SourceFile::StructuredWatch => Category::Watch,
            SourceFile::MarkupSearch | SourceFile::StructuredSearch => Category::Search,
            SourceFile::StructuredComments => Category::Comments,
            SourceFile::StructuredNotes => Category::Notes,
        }
    }
}
