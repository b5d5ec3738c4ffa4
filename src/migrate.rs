use anyhow::Result;
use sqlx::SqlitePool;

/// Creates the record tables. Idempotent; run by `tko init` and again
/// before every parse.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for table in ["watch_events", "search_events"] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                link TEXT,
                timestamp TEXT NOT NULL,
                timestamp_epoch INTEGER NOT NULL,
                description TEXT,
                details_json TEXT NOT NULL DEFAULT '[]',
                products_json TEXT NOT NULL DEFAULT '[]',
                identity_hash TEXT NOT NULL UNIQUE
            )
            "#
        ))
        .execute(pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_epoch ON {table}(timestamp_epoch)"
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            comment_id TEXT,
            video_id TEXT,
            channel_id TEXT,
            text TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            timestamp_epoch INTEGER NOT NULL,
            identity_hash TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_epoch ON comments(timestamp_epoch)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            source_id TEXT,
            title TEXT NOT NULL,
            created_time TEXT NOT NULL,
            created_epoch INTEGER NOT NULL,
            updated_time TEXT NOT NULL,
            updated_epoch INTEGER NOT NULL,
            text_content TEXT,
            list_content_json TEXT NOT NULL DEFAULT '[]',
            color TEXT,
            annotations_json TEXT NOT NULL DEFAULT '[]',
            is_trashed INTEGER NOT NULL DEFAULT 0,
            is_pinned INTEGER NOT NULL DEFAULT 0,
            is_archived INTEGER NOT NULL DEFAULT 0,
            identity_hash TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_epoch ON notes(created_epoch)")
        .execute(pool)
        .await?;

    Ok(())
}
