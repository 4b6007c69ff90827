//! SQLite schema definition
//!
//! One table holds every persisted key. Values are JSON-encoded text, the
//! same shape the browser front end kept in local storage.

pub const SCHEMA: &str = r#"
-- ============================================
-- KEY-VALUE STORE
-- ============================================

CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,                  -- 'databaseConnections', 'queries', ...
    value TEXT NOT NULL,                   -- JSON text
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_kv_updated ON kv(updated_at DESC);
"#;
