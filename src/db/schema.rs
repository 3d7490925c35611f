pub const SCHEMA: &str = r#"
-- posts table
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_type TEXT NOT NULL DEFAULT 'post',
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'draft',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status);

-- post_summaries table (enabled: NULL = unset, 0 = disabled, 1 = enabled)
CREATE TABLE IF NOT EXISTS post_summaries (
    post_id INTEGER PRIMARY KEY REFERENCES posts(id) ON DELETE CASCADE,
    enabled INTEGER,
    summary TEXT,
    regenerate_flag INTEGER NOT NULL DEFAULT 0,
    generated_at TEXT
);
"#;
