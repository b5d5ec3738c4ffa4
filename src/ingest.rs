//! Ingestion orchestration.
//!
//! Probes the export root for the recognized source files, dispatches each
//! present file to its format's extractor, and upserts the results one
//! file-batch at a time. A missing file is not an error, since a user's
//! export may lack whole categories, and a failing category never blocks
//! the others; partial success is the expected normal outcome.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::archive;
use crate::config::Config;
use crate::extractor_activity;
use crate::extractor_comments;
use crate::extractor_html;
use crate::extractor_keep;
use crate::migrate;
use crate::models::{ActivityKind, Category, SourceFile};
use crate::store::{BatchOutcome, Store};

/// Per-category ingestion counters.
#[derive(Debug, Default, Clone)]
pub struct CategoryReport {
    /// Records newly persisted this run.
    pub ingested: u64,
    /// Records absorbed as no-ops (identity already present).
    pub duplicates: u64,
    /// Entries discarded during extraction (malformed or advertisement).
    pub skipped: u64,
    /// Source files of this category that failed wholesale.
    pub failures: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    pub watch: CategoryReport,
    pub search: CategoryReport,
    pub comments: CategoryReport,
    pub notes: CategoryReport,
}

impl IngestReport {
    pub fn category(&self, category: Category) -> &CategoryReport {
        match category {
            Category::Watch => &self.watch,
            Category::Search => &self.search,
            Category::Comments => &self.comments,
            Category::Notes => &self.notes,
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut CategoryReport {
        match category {
            Category::Watch => &mut self.watch,
            Category::Search => &mut self.search,
            Category::Comments => &mut self.comments,
            Category::Notes => &mut self.notes,
        }
    }
}

/// Entry point for `tko parse`. Locates the export root (unpacking an
/// archive if needed), ensures the schema, ingests every present source
/// file, and prints the per-category report.
pub async fn run_parse(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let root = archive::open(path)?;
    let store = Store::connect(config).await?;
    migrate::run_migrations(store.pool()).await?;

    let report = ingest_root(&store, root.path(), dry_run).await?;

    println!(
        "parse {}{}",
        path.display(),
        if dry_run { " (dry-run)" } else { "" }
    );
    for category in Category::ALL {
        let c = report.category(category);
        let failed = if c.failures.is_empty() {
            String::new()
        } else {
            format!("  FAILED: {}", c.failures.join("; "))
        };
        println!(
            "  {:<9} ingested: {:<6} duplicates: {:<6} skipped: {}{}",
            category.label(),
            c.ingested,
            c.duplicates,
            c.skipped,
            failed
        );
    }
    println!("ok");

    store.close().await;
    Ok(())
}

/// Ingests every recognized source file present under `root`.
pub async fn ingest_root(store: &Store, root: &Path, dry_run: bool) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for file in SourceFile::ALL {
        let Some(path) = resolve(root, file) else {
            debug!(source = ?file, "source file absent, skipping");
            continue;
        };

        let entry = report.category_mut(file.category());
        match ingest_file(store, file, &path, dry_run).await {
            Ok((skipped, batch)) => {
                entry.ingested += batch.inserted;
                entry.duplicates += batch.deduped;
                entry.skipped += skipped;
            }
            Err(err) => {
                warn!(source = ?file, path = %path.display(), %err, "source file failed");
                entry.failures.push(format!("{}: {err}", path.display()));
            }
        }
    }

    Ok(report)
}

/// Probes the conventional relative paths for one source file, under both
/// `<root>/` and `<root>/Takeout/`.
fn resolve(root: &Path, file: SourceFile) -> Option<PathBuf> {
    for rel in file.candidate_paths() {
        for base in [root.to_path_buf(), root.join("Takeout")] {
            let candidate = base.join(rel);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

async fn ingest_file(
    store: &Store,
    file: SourceFile,
    path: &Path,
    dry_run: bool,
) -> Result<(u64, BatchOutcome)> {
    match file {
        SourceFile::MarkupWatch
        | SourceFile::MarkupSearch
        | SourceFile::StructuredWatch
        | SourceFile::StructuredSearch => {
            let kind = match file.category() {
                Category::Watch => ActivityKind::Watch,
                _ => ActivityKind::Search,
            };
            let text = std::fs::read_to_string(path)?;
            let extracted = match file {
                SourceFile::MarkupWatch | SourceFile::MarkupSearch => {
                    extractor_html::extract(&text, kind)?
                }
                _ => extractor_activity::extract(&text, kind)?,
            };
            if dry_run {
                return Ok((extracted.skipped, dry_outcome(extracted.records.len())));
            }
            let batch = store.insert_activity_batch(kind, &extracted.records).await?;
            Ok((extracted.skipped, batch))
        }
        SourceFile::StructuredComments => {
            let text = std::fs::read_to_string(path)?;
            let extracted = extractor_comments::extract(&text)?;
            if dry_run {
                return Ok((extracted.skipped, dry_outcome(extracted.records.len())));
            }
            let batch = store.insert_comment_batch(&extracted.records).await?;
            Ok((extracted.skipped, batch))
        }
        SourceFile::StructuredNotes => {
            let extracted = extractor_keep::extract_dir(path)?;
            if dry_run {
                return Ok((extracted.skipped, dry_outcome(extracted.records.len())));
            }
            let batch = store.insert_note_batch(&extracted.records).await?;
            Ok((extracted.skipped, batch))
        }
    }
}

fn dry_outcome(records: usize) -> BatchOutcome {
    BatchOutcome {
        inserted: records as u64,
        deduped: 0,
    }
}
