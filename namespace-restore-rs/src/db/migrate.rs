use crate::db::connection::DbPool;
use rusqlite::params;

/// Fixed identifier of the namespace root directory.
pub const ROOT_ID: &str = "00000000-0000-0000-0000-000000000000";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inodes (
  id TEXT PRIMARY KEY,
  parent_id TEXT REFERENCES inodes(id) ON DELETE CASCADE,
  name TEXT NOT NULL,
  kind TEXT NOT NULL CHECK(kind IN ('dir','file')),
  uid INTEGER NOT NULL DEFAULT 0,
  gid INTEGER NOT NULL DEFAULT 0,
  mode INTEGER NOT NULL,
  size INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL DEFAULT (datetime('now')),
  UNIQUE(parent_id, name)
);

CREATE TABLE IF NOT EXISTS checksums (
  inode_id TEXT NOT NULL REFERENCES inodes(id) ON DELETE CASCADE,
  algorithm INTEGER NOT NULL,
  digest TEXT NOT NULL,
  PRIMARY KEY (inode_id, algorithm)
);

CREATE TABLE IF NOT EXISTS storage_class (
  inode_id TEXT PRIMARY KEY REFERENCES inodes(id) ON DELETE CASCADE,
  hsm TEXT NOT NULL,
  store_class TEXT NOT NULL,
  class_group TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
  inode_id TEXT NOT NULL REFERENCES inodes(id) ON DELETE CASCADE,
  uri TEXT NOT NULL,
  created_at TEXT NOT NULL DEFAULT (datetime('now')),
  PRIMARY KEY (inode_id, uri)
);

CREATE INDEX IF NOT EXISTS idx_inodes_parent ON inodes(parent_id);
"#;

pub fn migrate(pool: &DbPool) -> anyhow::Result<()> {
    tracing::info!("[DB] Applying namespace schema...");

    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;

    // Seed the root directory. Idempotent for existing databases.
    conn.execute(
        "INSERT OR IGNORE INTO inodes (id, parent_id, name, kind, uid, gid, mode)
         VALUES (?1, NULL, '/', 'dir', 0, 0, ?2)",
        params![ROOT_ID, 0o755],
    )?;

    tracing::info!("[DB] Schema ready");
    Ok(())
}
