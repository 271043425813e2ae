//! SQLite-backed namespace store.
//!
//! One row per inode; `UNIQUE(parent_id, name)` carries the name
//! conflict, the primary key carries the identifier conflict. Both are
//! detected from SQLite extended result codes so a create fails
//! distinctly without a read-before-write.

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ffi, params, OptionalExtension};
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::db::migrate::ROOT_ID;
use crate::error::StoreError;
use crate::store::NamespaceStore;

pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}

/// Map an insert failure to the distinct conflict variants.
fn map_insert_err(e: rusqlite::Error, id: &str, name: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(f, _) = &e {
        if f.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
            return StoreError::IdExists(id.to_string());
        }
        if f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::NameExists(name.to_string());
        }
    }
    StoreError::Db(e)
}

impl NamespaceStore for SqliteStore {
    fn root(&self) -> Result<String, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id FROM inodes WHERE id = ?1 AND kind = 'dir'",
            params![ROOT_ID],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound("/".to_string()))
    }

    fn create_dir(
        &self,
        parent: &str,
        name: &str,
        uid: u32,
        gid: u32,
        mode: u32,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO inodes (id, parent_id, name, kind, uid, gid, mode)
             VALUES (?1, ?2, ?3, 'dir', ?4, ?5, ?6)",
            params![id, parent, name, uid, gid, mode],
        )
        .map_err(|e| map_insert_err(e, &id, name))?;
        Ok(id)
    }

    fn lookup_child(&self, parent: &str, name: &str) -> Result<String, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id FROM inodes WHERE parent_id = ?1 AND name = ?2",
            params![parent, name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn contains_id(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM inodes WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn create_file_with_id(
        &self,
        parent: &str,
        id: &str,
        name: &str,
        uid: u32,
        gid: u32,
        mode: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO inodes (id, parent_id, name, kind, uid, gid, mode)
             VALUES (?1, ?2, ?3, 'file', ?4, ?5, ?6)",
            params![id, parent, name, uid, gid, mode],
        )
        .map_err(|e| map_insert_err(e, id, name))?;
        Ok(())
    }

    fn set_size(&self, id: &str, size: u64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        // SQLite integers are signed; clamp rather than wrap negative.
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        let changed = conn.execute(
            "UPDATE inodes SET size = ?2 WHERE id = ?1",
            params![id, size],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_checksum(&self, id: &str, algorithm: u32, digest: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO checksums (inode_id, algorithm, digest)
             VALUES (?1, ?2, ?3)",
            params![id, algorithm, digest],
        )?;
        Ok(())
    }

    fn set_storage_class(
        &self,
        id: &str,
        hsm: &str,
        store_class: &str,
        group: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO storage_class (inode_id, hsm, store_class, class_group)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, hsm, store_class, group],
        )?;
        Ok(())
    }

    fn add_location(&self, id: &str, uri: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO locations (inode_id, uri) VALUES (?1, ?2)",
            params![id, uri],
        )?;
        Ok(())
    }
}
