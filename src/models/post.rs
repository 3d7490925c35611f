use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_PUBLISH: &str = "publish";
pub const STATUS_DRAFT: &str = "draft";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISH
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
}
