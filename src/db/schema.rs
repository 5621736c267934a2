pub const LEGACY_HISTORY_TABLE: &str = "history";

pub const CREATE_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS history_v2 (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  type TEXT NOT NULL DEFAULT 'unknown',
  subCategory TEXT DEFAULT NULL,
  content TEXT DEFAULT '',
  templateIndex INTEGER DEFAULT 0,
  createdAt TEXT NOT NULL,
  imageData TEXT DEFAULT NULL
);
"#;

pub const CREATE_INDEX_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_history_created_at ON history_v2(createdAt DESC, id DESC);";

/// Columns carried over from the legacy table, with the SQL used when the
/// legacy table lacks the column or holds NULL in it.
pub const LEGACY_COLUMN_FALLBACKS: [(&str, &str); 6] = [
    ("type", "'unknown'"),
    ("subCategory", "NULL"),
    ("content", "''"),
    ("templateIndex", "0"),
    ("createdAt", "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"),
    ("imageData", "NULL"),
];
