//! Keyed record store over SQLite.
//!
//! Inserts are keyed by each record's natural identity hash: a row whose
//! identity already exists is absorbed as a no-op, which is what makes
//! re-ingestion idempotent and collapses cross-format duplicates. One
//! source file's records are written inside one transaction, so a failed
//! batch leaves no partially-ingested file behind. Store-assigned ids are
//! UUIDs, independent of the extractors.
//!
//! The store also owns the database connection: [`Store::connect`] opens
//! the configured SQLite file in WAL mode, creating it on first use.

use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{ActivityEvent, ActivityKind, Category, Comment, Note, NoteListItem};

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Result of one batch insert.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchOutcome {
    pub inserted: u64,
    pub deduped: u64,
}

/// A stored activity event, as served to the read API.
#[derive(Debug, Clone, Serialize)]
pub struct StoredActivity {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredComment {
    pub id: String,
    pub comment_id: Option<String>,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredNote {
    pub id: String,
    pub source_id: Option<String>,
    pub title: String,
    pub created_time: String,
    pub updated_time: String,
    pub text_content: Option<String>,
    pub list_content: Vec<NoteListItem>,
    pub color: Option<String>,
    pub annotations: Vec<serde_json::Value>,
    pub is_trashed: bool,
    pub is_pinned: bool,
    pub is_archived: bool,
}

fn activity_table(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Watch => "watch_events",
        ActivityKind::Search => "search_events",
    }
}

fn category_table(category: Category) -> &'static str {
    match category {
        Category::Watch => "watch_events",
        Category::Search => "search_events",
        Category::Comments => "comments",
        Category::Notes => "notes",
    }
}

impl Store {
    /// Opens the configured SQLite database, creating the file and its
    /// parent directory on first use. WAL keeps the viewer API readable
    /// while a parse run is writing.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db_path = &config.db.path;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Inserts one file's activity events in a single transaction.
    pub async fn insert_activity_batch(
        &self,
        kind: ActivityKind,
        events: &[ActivityEvent],
    ) -> Result<BatchOutcome> {
        let table = activity_table(kind);
        let sql = format!(
            r#"
            INSERT INTO {table}
                (id, title, link, timestamp, timestamp_epoch, description,
                 details_json, products_json, identity_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(identity_hash) DO NOTHING
            "#
        );

        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();
        for event in events {
            let result = sqlx::query(&sql)
                .bind(Uuid::new_v4().to_string())
                .bind(&event.title)
                .bind(&event.link)
                .bind(event.timestamp.to_string())
                .bind(event.timestamp.epoch_seconds())
                .bind(&event.description)
                .bind(serde_json::to_string(&event.details)?)
                .bind(serde_json::to_string(&event.products)?)
                .bind(event.identity_hash(kind))
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.deduped += 1;
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn insert_comment_batch(&self, comments: &[Comment]) -> Result<BatchOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();
        for comment in comments {
            let result = sqlx::query(
                r#"
                INSERT INTO comments
                    (id, comment_id, video_id, channel_id, text, timestamp,
                     timestamp_epoch, identity_hash)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(identity_hash) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&comment.comment_id)
            .bind(&comment.video_id)
            .bind(&comment.channel_id)
            .bind(&comment.text)
            .bind(comment.timestamp.to_string())
            .bind(comment.timestamp.epoch_seconds())
            .bind(comment.identity_hash())
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.deduped += 1;
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn insert_note_batch(&self, notes: &[Note]) -> Result<BatchOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();
        for note in notes {
            let result = sqlx::query(
                r#"
                INSERT INTO notes
                    (id, source_id, title, created_time, created_epoch,
                     updated_time, updated_epoch, text_content, list_content_json,
                     color, annotations_json, is_trashed, is_pinned, is_archived,
                     identity_hash)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(identity_hash) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&note.source_id)
            .bind(&note.title)
            .bind(note.created_time.to_string())
            .bind(note.created_time.epoch_seconds())
            .bind(note.updated_time.to_string())
            .bind(note.updated_time.epoch_seconds())
            .bind(&note.text_content)
            .bind(serde_json::to_string(&note.list_content)?)
            .bind(&note.color)
            .bind(serde_json::to_string(&note.annotations)?)
            .bind(note.is_trashed)
            .bind(note.is_pinned)
            .bind(note.is_archived)
            .bind(note.identity_hash())
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.deduped += 1;
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    /// Lists activity events in chronological order. `limit = -1` means all.
    pub async fn list_activity(
        &self,
        kind: ActivityKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredActivity>> {
        let table = activity_table(kind);
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, title, link, timestamp, description, details_json, products_json
            FROM {table}
            ORDER BY timestamp_epoch, id
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(activity_from_row).collect()
    }

    pub async fn list_comments(&self, limit: i64, offset: i64) -> Result<Vec<StoredComment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, comment_id, video_id, channel_id, text, timestamp
            FROM comments
            ORDER BY timestamp_epoch, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredComment {
                id: row.get("id"),
                comment_id: row.get("comment_id"),
                video_id: row.get("video_id"),
                channel_id: row.get("channel_id"),
                text: row.get("text"),
                timestamp: row.get("timestamp"),
            })
            .collect())
    }

    pub async fn list_notes(&self, limit: i64, offset: i64) -> Result<Vec<StoredNote>> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_id, title, created_time, updated_time, text_content,
                   list_content_json, color, annotations_json,
                   is_trashed, is_pinned, is_archived
            FROM notes
            ORDER BY created_epoch, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(note_from_row).collect()
    }

    pub async fn count(&self, category: Category) -> Result<i64> {
        let table = category_table(category);
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Removes all records of a category, reporting how many were removed.
    pub async fn clear(&self, category: Category) -> Result<u64> {
        let table = category_table(category);
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn activity_from_row(row: SqliteRow) -> Result<StoredActivity> {
    let details_json: String = row.get("details_json");
    let products_json: String = row.get("products_json");
    Ok(StoredActivity {
        id: row.get("id"),
        title: row.get("title"),
        link: row.get("link"),
        timestamp: row.get("timestamp"),
        description: row.get("description"),
        details: serde_json::from_str(&details_json)?,
        products: serde_json::from_str(&products_json)?,
    })
}

fn note_from_row(row: SqliteRow) -> Result<StoredNote> {
    let list_json: String = row.get("list_content_json");
    let annotations_json: String = row.get("annotations_json");
    Ok(StoredNote {
        id: row.get("id"),
        source_id: row.get("source_id"),
        title: row.get("title"),
        created_time: row.get("created_time"),
        updated_time: row.get("updated_time"),
        text_content: row.get("text_content"),
        list_content: serde_json::from_str(&list_json)?,
        annotations: serde_json::from_str(&annotations_json)?,
        color: row.get("color"),
        is_trashed: row.get("is_trashed"),
        is_pinned: row.get("is_pinned"),
        is_archived: row.get("is_archived"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefmt::CanonicalTimestamp;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().join("test.sqlite");
        let store = Store::connect(&config).await.unwrap();
        crate::migrate::run_migrations(store.pool()).await.unwrap();
        (tmp, store)
    }

    fn event(title: &str, iso: &str) -> ActivityEvent {
        ActivityEvent {
            title: title.to_string(),
            link: Some(format!("https://y/{title}")),
            timestamp: CanonicalTimestamp::parse(iso).unwrap(),
            description: None,
            details: vec![],
            products: vec![],
        }
    }

    #[tokio::test]
    async fn connect_creates_database_and_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().join("nested/data/takeout.sqlite");

        let store = Store::connect(&config).await.unwrap();
        crate::migrate::run_migrations(store.pool()).await.unwrap();
        assert!(config.db.path.is_file());
        assert_eq!(store.count(Category::Watch).await.unwrap(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn batch_insert_is_idempotent() {
        let (_tmp, store) = test_store().await;
        let events = [
            event("a", "2024-03-05T10:00:00Z"),
            event("b", "2024-03-05T11:00:00Z"),
        ];

        let first = store
            .insert_activity_batch(ActivityKind::Watch, &events)
            .await
            .unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.deduped, 0);

        let second = store
            .insert_activity_batch(ActivityKind::Watch, &events)
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.deduped, 2);

        assert_eq!(store.count(Category::Watch).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn cross_format_duplicates_collapse() {
        let (_tmp, store) = test_store().await;

        // Markup rendering: bare triple.
        let markup = event("same", "2024-03-05T10:00:00Z");
        // Structured rendering of the same event: extra passthrough fields.
        let mut structured = markup.clone();
        structured.description = Some("richer".to_string());
        structured.products = vec!["YouTube".to_string()];

        store
            .insert_activity_batch(ActivityKind::Watch, &[markup])
            .await
            .unwrap();
        let second = store
            .insert_activity_batch(ActivityKind::Watch, &[structured])
            .await
            .unwrap();
        assert_eq!(second.deduped, 1);
        assert_eq!(store.count(Category::Watch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_is_chronological_with_store_ids() {
        let (_tmp, store) = test_store().await;
        let events = [
            event("later", "2024-03-06T10:00:00Z"),
            event("earlier", "2024-03-05T10:00:00Z"),
        ];
        store
            .insert_activity_batch(ActivityKind::Search, &events)
            .await
            .unwrap();

        let listed = store.list_activity(ActivityKind::Search, -1, 0).await.unwrap();
        let titles: Vec<_> = listed.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["earlier", "later"]);
        assert!(!listed[0].id.is_empty());
    }

    #[tokio::test]
    async fn activity_details_round_trip_as_objects() {
        let (_tmp, store) = test_store().await;
        let mut detailed = event("detailed", "2024-03-05T10:00:00Z");
        detailed.details =
            vec![serde_json::json!({"name": "From partner program", "sourceIds": ["p1"]})];
        store
            .insert_activity_batch(ActivityKind::Watch, &[detailed])
            .await
            .unwrap();

        let listed = store.list_activity(ActivityKind::Watch, -1, 0).await.unwrap();
        assert_eq!(listed[0].details[0]["name"], "From partner program");
        assert_eq!(listed[0].details[0]["sourceIds"][0], "p1");
    }

    #[tokio::test]
    async fn clear_reports_removed_count() {
        let (_tmp, store) = test_store().await;
        let ts = CanonicalTimestamp::parse("2024-03-05T10:00:00Z").unwrap();
        store
            .insert_comment_batch(&[Comment {
                comment_id: Some("c1".to_string()),
                video_id: None,
                channel_id: None,
                text: "hello".to_string(),
                timestamp: ts,
            }])
            .await
            .unwrap();

        assert_eq!(store.clear(Category::Comments).await.unwrap(), 1);
        assert_eq!(store.count(Category::Comments).await.unwrap(), 0);
        assert_eq!(store.clear(Category::Comments).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn note_round_trips_structured_fields() {
        let (_tmp, store) = test_store().await;
        let ts = CanonicalTimestamp::parse("2024-03-05T10:00:00Z").unwrap();
        let note = Note {
            source_id: Some("groceries".to_string()),
            title: "Groceries".to_string(),
            created_time: ts,
            updated_time: ts,
            text_content: None,
            list_content: vec![NoteListItem {
                text: "eggs".to_string(),
                is_checked: true,
            }],
            color: Some("DEFAULT".to_string()),
            annotations: vec![serde_json::json!({"source": "WEBLINK"})],
            is_trashed: false,
            is_pinned: true,
            is_archived: false,
        };
        store.insert_note_batch(&[note]).await.unwrap();

        let listed = store.list_notes(-1, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].list_content[0].text, "eggs");
        assert!(listed[0].is_pinned);
        assert_eq!(listed[0].annotations[0]["source"], "WEBLINK");
    }
}
