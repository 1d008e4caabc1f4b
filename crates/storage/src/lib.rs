use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::domain::{Segment, SegmentId, Story, StoryId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_story(&self, title: &str) -> Result<Story> {
        let result = sqlx::query("INSERT INTO stories (title) VALUES (?1)")
            .bind(title)
            .execute(&self.pool)
            .await
            .context("failed to insert story")?;
        let story_id = StoryId(result.last_insert_rowid());

        let row = sqlx::query("SELECT id, title, created_at FROM stories WHERE id = ?1")
            .bind(story_id.0)
            .fetch_one(&self.pool)
            .await
            .context("failed to read back created story")?;
        story_from_row(&row)
    }

    /// Newest first, matching the order the story list is displayed in.
    pub async fn list_stories(&self) -> Result<Vec<Story>> {
        let rows =
            sqlx::query("SELECT id, title, created_at FROM stories ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await
                .context("failed to list stories")?;
        rows.iter().map(story_from_row).collect()
    }

    pub async fn story_exists(&self, story_id: StoryId) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM stories WHERE id = ?1")
            .bind(story_id.0)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up story")?;
        Ok(row.is_some())
    }

    /// Deletes the story and all of its segments. Returns false when the
    /// story did not exist.
    pub async fn delete_story(&self, story_id: StoryId) -> Result<bool> {
        if !self.story_exists(story_id).await? {
            return Ok(false);
        }
        sqlx::query("DELETE FROM story_segments WHERE story_id = ?1")
            .bind(story_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete story segments")?;
        sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(story_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete story")?;
        Ok(true)
    }

    /// Oldest first; ties on the timestamp fall back to insertion order so
    /// rapid appends keep their append order.
    pub async fn list_segments(&self, story_id: StoryId) -> Result<Vec<Segment>> {
        let rows = sqlx::query(
            "SELECT id, story_id, text, created_at FROM story_segments \
             WHERE story_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(story_id.0)
        .fetch_all(&self.pool)
        .await
        .context("failed to list segments")?;
        rows.iter().map(segment_from_row).collect()
    }

    pub async fn insert_segment(&self, story_id: StoryId, text: &str) -> Result<SegmentId> {
        let result = sqlx::query("INSERT INTO story_segments (story_id, text) VALUES (?1, ?2)")
            .bind(story_id.0)
            .bind(text)
            .execute(&self.pool)
            .await
            .context("failed to insert segment")?;
        Ok(SegmentId(result.last_insert_rowid()))
    }

    /// Returns false when no segment with this id belongs to the story.
    pub async fn delete_segment(&self, story_id: StoryId, segment_id: SegmentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM story_segments WHERE id = ?1 AND story_id = ?2")
            .bind(segment_id.0)
            .bind(story_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete segment")?;
        Ok(result.rows_affected() > 0)
    }
}

fn story_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Story> {
    Ok(Story {
        id: StoryId(row.try_get("id")?),
        title: row.try_get("title")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn segment_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Segment> {
    Ok(Segment {
        id: SegmentId(row.try_get("id")?),
        story_id: StoryId(row.try_get("story_id")?),
        text: row.try_get("text")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
