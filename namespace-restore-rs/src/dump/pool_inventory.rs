//! Decoder for the structured pool-inventory dump.
//!
//! The dump is a mapping from record identifier to a record with a
//! lifecycle `state`, a `filesize`, and a nested key/value `map`
//! holding path, ownership, and the checksum flag. Only records in
//! state `PRECIOUS` are eligible: any other state means the content
//! was not yet safely committed when the dump was taken.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use anyhow::Context;
use serde::Deserialize;
use serde_yaml_ng::Value;

use crate::models::entry::{parse_checksum, uint_or_zero, FileEntry};

const STATE_PRECIOUS: &str = "PRECIOUS";

#[derive(Debug, Deserialize)]
struct PoolRecord {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    filesize: Option<Value>,
    #[serde(default)]
    map: HashMap<String, Value>,
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct PoolInventoryDecoder {
    records: std::collections::btree_map::IntoIter<String, PoolRecord>,
}

impl PoolInventoryDecoder {
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let inventory: BTreeMap<String, PoolRecord> =
            serde_yaml_ng::from_reader(reader).context("could not parse pool inventory dump")?;
        Ok(Self {
            records: inventory.into_iter(),
        })
    }
}

impl Iterator for PoolInventoryDecoder {
    // The whole document was already read; entries cannot fail
    // mid-stream, but the item type matches the line-oriented decoder.
    type Item = std::io::Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (record_id, record) = self.records.next()?;

            if record.state.as_deref() != Some(STATE_PRECIOUS) {
                tracing::debug!(
                    "skipping {} in state {}",
                    record_id,
                    record.state.as_deref().unwrap_or("<none>")
                );
                continue;
            }

            let Some(path) = as_text(record.map.get("path")) else {
                tracing::warn!("path is not available: {}", record_id);
                continue;
            };

            return Some(Ok(FileEntry {
                record_id,
                path: Some(path),
                uid: uint_or_zero(as_text(record.map.get("uid")).as_deref()),
                gid: uint_or_zero(as_text(record.map.get("gid")).as_deref()),
                size: uint_or_zero(as_text(record.filesize.as_ref()).as_deref()),
                checksum: as_text(record.map.get("flag-c"))
                    .and_then(|raw| parse_checksum(&raw)),
                // A PRECIOUS record was already committed to the store;
                // its storage-class binding belongs to a later lifecycle
                // stage that this dump does not carry.
                storage_group: None,
                hsm: None,
            }));
        }
    }
}
