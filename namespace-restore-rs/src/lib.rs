//! Namespace restoration from flat backup/HSM dump records.
//!
//! Rebuilds a lost directory tree and per-file metadata (owner, size,
//! checksum, storage-class binding) by replaying dump records into a
//! namespace store. File content stays in the external HSM backend;
//! only the namespace is restored.

pub mod db;
pub mod dump;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
