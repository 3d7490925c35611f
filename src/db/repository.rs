use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{EnabledState, NewPost, Post, PostSummaryMeta};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Post operations

    pub async fn insert_post(&self, post: NewPost) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO posts (post_type, title, content, status) VALUES (?1, ?2, ?3, ?4)",
                    params![post.post_type, post.title, post.content, post.status],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, post_type, title, content, status, created_at, updated_at FROM posts WHERE id = ?1",
                )?;
                let post = stmt.query_row(params![id], post_from_row).optional()?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    /// Returns false when no post has this id.
    pub async fn update_post_content(
        &self,
        id: i64,
        title: Option<String>,
        content: String,
    ) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"UPDATE posts SET
                           title = COALESCE(?1, title),
                           content = ?2,
                           updated_at = datetime('now')
                       WHERE id = ?3"#,
                    params![title, content, id],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(changed)
    }

    /// Set the post status and return the previous one, or `None` when the
    /// post does not exist.
    pub async fn set_post_status(&self, id: i64, status: String) -> Result<Option<String>> {
        let previous = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let previous: Option<String> = tx
                    .query_row(
                        "SELECT status FROM posts WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if previous.is_some() {
                    tx.execute(
                        "UPDATE posts SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                        params![status, id],
                    )?;
                }
                tx.commit()?;
                Ok(previous)
            })
            .await?;
        Ok(previous)
    }

    // Summary metadata operations

    /// Metadata for a post; posts that were never saved with summary fields
    /// come back as all-unset.
    pub async fn get_summary_meta(&self, post_id: i64) -> Result<PostSummaryMeta> {
        let meta = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT post_id, enabled, summary, regenerate_flag, generated_at FROM post_summaries WHERE post_id = ?1",
                )?;
                let meta = stmt.query_row(params![post_id], meta_from_row).optional()?;
                Ok(meta)
            })
            .await?;
        Ok(meta.unwrap_or_else(|| PostSummaryMeta::unset(post_id)))
    }

    pub async fn set_enabled(&self, post_id: i64, enabled: EnabledState) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO post_summaries (post_id, enabled) VALUES (?1, ?2)
                       ON CONFLICT(post_id) DO UPDATE SET enabled = excluded.enabled"#,
                    params![post_id, enabled.to_column()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_regenerate_flag(&self, post_id: i64, flag: bool) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO post_summaries (post_id, regenerate_flag) VALUES (?1, ?2)
                       ON CONFLICT(post_id) DO UPDATE SET regenerate_flag = excluded.regenerate_flag"#,
                    params![post_id, flag],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Store a freshly generated summary and clear any pending regeneration.
    pub async fn save_summary(&self, post_id: i64, summary: String) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO post_summaries (post_id, summary, regenerate_flag, generated_at)
                       VALUES (?1, ?2, 0, datetime('now'))
                       ON CONFLICT(post_id) DO UPDATE SET
                           summary = excluded.summary,
                           regenerate_flag = 0,
                           generated_at = excluded.generated_at"#,
                    params![post_id, summary],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        post_type: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        status: row.get(4)?,
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn meta_from_row(row: &Row) -> rusqlite::Result<PostSummaryMeta> {
    Ok(PostSummaryMeta {
        post_id: row.get(0)?,
        enabled: EnabledState::from_column(row.get(1)?),
        summary: row.get(2)?,
        regenerate_flag: row.get::<_, i64>(3)? != 0,
        generated_at: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| parse_datetime(&s)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STATUS_DRAFT;

    fn new_post(content: &str) -> NewPost {
        NewPost {
            post_type: "post".to_string(),
            title: "Budget vote".to_string(),
            content: content.to_string(),
            status: STATUS_DRAFT.to_string(),
        }
    }

    #[tokio::test]
    async fn posts_round_trip() {
        let repo = Repository::open_in_memory().await.unwrap();
        let id = repo.insert_post(new_post("<p>Body</p>")).await.unwrap();

        let post = repo.get_post(id).await.unwrap().unwrap();
        assert_eq!(post.title, "Budget vote");
        assert_eq!(post.content, "<p>Body</p>");
        assert!(!post.is_published());

        assert!(repo
            .update_post_content(id, None, "<p>New body</p>".to_string())
            .await
            .unwrap());
        let post = repo.get_post(id).await.unwrap().unwrap();
        assert_eq!(post.title, "Budget vote");
        assert_eq!(post.content, "<p>New body</p>");

        assert!(repo.get_post(id + 1).await.unwrap().is_none());
        assert!(!repo
            .update_post_content(id + 1, None, String::new())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn status_change_returns_previous_status() {
        let repo = Repository::open_in_memory().await.unwrap();
        let id = repo.insert_post(new_post("Body")).await.unwrap();

        let previous = repo.set_post_status(id, "publish".to_string()).await.unwrap();
        assert_eq!(previous.as_deref(), Some("draft"));
        assert!(repo.get_post(id).await.unwrap().unwrap().is_published());

        assert_eq!(repo.set_post_status(99, "publish".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn meta_defaults_to_unset() {
        let repo = Repository::open_in_memory().await.unwrap();
        let meta = repo.get_summary_meta(42).await.unwrap();
        assert_eq!(meta.post_id, 42);
        assert_eq!(meta.enabled, EnabledState::Unset);
        assert!(!meta.has_summary());
        assert!(!meta.regenerate_flag);
    }

    #[tokio::test]
    async fn enabled_state_keeps_three_values() {
        let repo = Repository::open_in_memory().await.unwrap();
        let id = repo.insert_post(new_post("Body")).await.unwrap();

        repo.set_regenerate_flag(id, true).await.unwrap();
        assert_eq!(
            repo.get_summary_meta(id).await.unwrap().enabled,
            EnabledState::Unset
        );

        for state in [EnabledState::Disabled, EnabledState::Enabled, EnabledState::Unset] {
            repo.set_enabled(id, state).await.unwrap();
            assert_eq!(repo.get_summary_meta(id).await.unwrap().enabled, state);
        }
    }

    #[tokio::test]
    async fn saving_summary_clears_regeneration_flag() {
        let repo = Repository::open_in_memory().await.unwrap();
        let id = repo.insert_post(new_post("Body")).await.unwrap();

        repo.set_enabled(id, EnabledState::Enabled).await.unwrap();
        repo.set_regenerate_flag(id, true).await.unwrap();
        repo.save_summary(id, "Fresh summary.".to_string())
            .await
            .unwrap();

        let meta = repo.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.summary.as_deref(), Some("Fresh summary."));
        assert!(!meta.regenerate_flag);
        assert_eq!(meta.enabled, EnabledState::Enabled);
        assert!(meta.generated_at.is_some());
    }

    #[tokio::test]
    async fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.db");
        let path = path.to_string_lossy().to_string();

        let id = {
            let repo = Repository::new(&path).await.unwrap();
            let id = repo.insert_post(new_post("Body")).await.unwrap();
            repo.save_summary(id, "Kept.".to_string()).await.unwrap();
            id
        };

        let repo = Repository::new(&path).await.unwrap();
        let meta = repo.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.summary.as_deref(), Some("Kept."));
    }
}
