//! Namespace store seam.
//!
//! The restoration engine only ever talks to this trait; the SQLite
//! implementation below is one backend for it. Objects are addressed
//! by plain string identifiers. Directory identifiers are allocated by
//! the store, file identifiers come from the dump records.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;

pub trait NamespaceStore {
    /// Identifier of the root directory.
    fn root(&self) -> Result<String, StoreError>;

    /// Create a child directory, returning its new identifier.
    /// Fails with `StoreError::NameExists` when the name is taken.
    fn create_dir(
        &self,
        parent: &str,
        name: &str,
        uid: u32,
        gid: u32,
        mode: u32,
    ) -> Result<String, StoreError>;

    /// Look up a child by name, returning its identifier only (no
    /// attribute fetch). Fails with `StoreError::NotFound` when absent.
    fn lookup_child(&self, parent: &str, name: &str) -> Result<String, StoreError>;

    /// Whether an object already exists under the given identifier.
    fn contains_id(&self, id: &str) -> Result<bool, StoreError>;

    /// Create a file object under an externally-assigned identifier.
    /// Fails with `StoreError::IdExists` when the identifier is taken
    /// and with `StoreError::NameExists` when the name is taken under
    /// a different identifier.
    fn create_file_with_id(
        &self,
        parent: &str,
        id: &str,
        name: &str,
        uid: u32,
        gid: u32,
        mode: u32,
    ) -> Result<(), StoreError>;

    fn set_size(&self, id: &str, size: u64) -> Result<(), StoreError>;

    fn set_checksum(&self, id: &str, algorithm: u32, digest: &str) -> Result<(), StoreError>;

    fn set_storage_class(
        &self,
        id: &str,
        hsm: &str,
        store_class: &str,
        group: &str,
    ) -> Result<(), StoreError>;

    /// Register a backend location reference for the object.
    fn add_location(&self, id: &str, uri: &str) -> Result<(), StoreError>;
}
