//! SQLite schema definition.

/// Complete database schema for medibook.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Session State (single-key snapshots, e.g. the signed-in identity)
-- ============================================================================

CREATE TABLE IF NOT EXISTS session_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
