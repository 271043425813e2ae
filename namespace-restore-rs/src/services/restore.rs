//! Restoration engine.
//!
//! Replays decoded entries into the namespace store, one entry at a
//! time: resolve the parent directory (creating missing ancestors,
//! memoized per run), then create the file under its dump-assigned
//! identifier and attach its attributes. Replay is idempotent: an
//! identifier already present in the store is skipped, so re-running a
//! dump or resuming a killed run is safe. A name taken under a
//! different identifier is retried once under a mangled name; any
//! other store failure aborts the run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::error::StoreError;
use crate::models::entry::FileEntry;
use crate::store::NamespaceStore;

/// Appended between basename and record id when a name is already
/// taken under a different identifier. `;` cannot survive sub-record
/// decoding, so a mangled name never collides with a decoded one.
pub const NAME_CONFLICT_MARKER: &str = ";";

/// HSM backend assumed when a record carries a storage class but no
/// backend name.
const DEFAULT_HSM: &str = "osm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    SkippedDuplicate,
    RenamedOnConflict(String),
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub created: u64,
    pub renamed: u64,
    pub skipped: u64,
    pub rejected: u64,
}

pub struct Restorer<'a, S: NamespaceStore> {
    store: &'a S,
    /// Absolute parent path -> directory id, for the lifetime of the run.
    dir_cache: HashMap<String, String>,
}

impl<'a, S: NamespaceStore> Restorer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            dir_cache: HashMap::new(),
        }
    }

    /// Return the directory id for an absolute path, creating every
    /// missing ancestor. Pre-existing directories are walked, not
    /// recreated. The full walk is skipped for a previously resolved
    /// exact path.
    pub fn resolve_parent(&mut self, path: &str) -> Result<String, StoreError> {
        if let Some(id) = self.dir_cache.get(path) {
            return Ok(id.clone());
        }

        let mut dir = self.store.root()?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            dir = match self.store.create_dir(&dir, segment, 0, 0, 0o755) {
                Ok(id) => id,
                Err(StoreError::NameExists(_)) => self.store.lookup_child(&dir, segment)?,
                Err(e) => return Err(e),
            };
        }

        self.dir_cache.insert(path.to_string(), dir.clone());
        Ok(dir)
    }

    /// Replay one entry into the store.
    pub fn restore(&mut self, entry: &FileEntry) -> Result<Outcome, StoreError> {
        let Some(path) = entry.path.as_deref() else {
            tracing::warn!("{}: record has no path, rejected", entry.record_id);
            return Ok(Outcome::Rejected);
        };
        let Some((parent_path, name)) = split_path(path) else {
            tracing::warn!("{}: no basename in {}, rejected", entry.record_id, path);
            return Ok(Outcome::Rejected);
        };

        let parent = self.resolve_parent(&parent_path)?;

        if self.store.contains_id(&entry.record_id)? {
            tracing::info!("{}: already restored, skipping", entry.record_id);
            return Ok(Outcome::SkippedDuplicate);
        }

        tracing::info!(
            "create: {} -> {} {} {} {}",
            entry.record_id,
            path,
            entry.uid,
            entry.gid,
            entry.size
        );

        match self
            .store
            .create_file_with_id(&parent, &entry.record_id, &name, entry.uid, entry.gid, 0o644)
        {
            Ok(()) => {
                self.apply_attributes(entry)?;
                Ok(Outcome::Created)
            }
            Err(StoreError::IdExists(_)) => {
                tracing::info!("{}: already restored, skipping", entry.record_id);
                Ok(Outcome::SkippedDuplicate)
            }
            Err(StoreError::NameExists(_)) => {
                let renamed = format!("{}{}{}", name, NAME_CONFLICT_MARKER, entry.record_id);
                tracing::warn!(
                    "{}: name {} taken under another id, restoring as {}",
                    entry.record_id,
                    name,
                    renamed
                );
                // A second collision on the mangled name is not
                // recoverable and aborts the run.
                self.store.create_file_with_id(
                    &parent,
                    &entry.record_id,
                    &renamed,
                    entry.uid,
                    entry.gid,
                    0o644,
                )?;
                self.apply_attributes(entry)?;
                Ok(Outcome::RenamedOnConflict(renamed))
            }
            Err(e) => Err(e),
        }
    }

    fn apply_attributes(&self, entry: &FileEntry) -> Result<(), StoreError> {
        // The object carries no content bytes; size is pure metadata.
        self.store.set_size(&entry.record_id, entry.size)?;

        if let Some(checksum) = &entry.checksum {
            self.store
                .set_checksum(&entry.record_id, checksum.algorithm, &checksum.digest)?;
        }

        if let Some(sg) = &entry.storage_group {
            let hsm = entry.hsm.as_deref().unwrap_or(DEFAULT_HSM);
            self.store
                .set_storage_class(&entry.record_id, hsm, &sg.store_class, &sg.group)?;
            let uri = format!(
                "{}://{}/{}/{}",
                hsm, sg.store_class, sg.group, entry.record_id
            );
            self.store.add_location(&entry.record_id, &uri)?;
        }

        Ok(())
    }
}

/// Replay a whole entry sequence, counting per-entry outcomes. A read
/// failure on the dump is fatal: a truncated dump must abort, not
/// report a partial restore as success.
pub fn restore_dump<S: NamespaceStore>(
    store: &S,
    entries: impl Iterator<Item = std::io::Result<FileEntry>>,
) -> anyhow::Result<RestoreSummary> {
    let mut restorer = Restorer::new(store);
    let mut summary = RestoreSummary::default();

    for entry in entries {
        let entry = entry.context("dump read failed")?;
        match restorer.restore(&entry)? {
            Outcome::Created => summary.created += 1,
            Outcome::RenamedOnConflict(_) => summary.renamed += 1,
            Outcome::SkippedDuplicate => summary.skipped += 1,
            Outcome::Rejected => summary.rejected += 1,
        }
    }

    tracing::info!(
        "restored {} entries ({} renamed on conflict), {} skipped, {} rejected",
        summary.created + summary.renamed,
        summary.renamed,
        summary.skipped,
        summary.rejected
    );
    Ok(summary)
}

fn split_path(path: &str) -> Option<(String, String)> {
    let p = Path::new(path);
    let name = p.file_name()?.to_str()?.to_string();
    let parent = p
        .parent()
        .map(|d| d.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    Some((parent, name))
}
