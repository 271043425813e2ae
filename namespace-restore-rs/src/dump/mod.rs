//! Dump decoding.
//!
//! Two structurally different dump formats normalize into the same
//! lazy sequence of [`FileEntry`] values. A malformed record is logged
//! and skipped; it never stops the stream.

pub mod backup_log;
pub mod pool_inventory;

pub use backup_log::BackupLogDecoder;
pub use pool_inventory::PoolInventoryDecoder;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;

use crate::models::entry::FileEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// Line-oriented backup log ("tsm").
    Tsm,
    /// Structured pool-inventory dump ("yaml").
    Yaml,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tsm" => Ok(DumpFormat::Tsm),
            "yaml" => Ok(DumpFormat::Yaml),
            other => Err(other.to_string()),
        }
    }
}

/// Open a dump file and return the decoded entry sequence. A read
/// failure mid-stream surfaces as an `Err` item; the consumer decides
/// whether to abort.
pub fn open_dump(
    path: &Path,
    format: DumpFormat,
) -> anyhow::Result<Box<dyn Iterator<Item = std::io::Result<FileEntry>>>> {
    let file = File::open(path)
        .with_context(|| format!("could not open dump file {}", path.display()))?;

    match format {
        DumpFormat::Tsm => Ok(Box::new(BackupLogDecoder::new(BufReader::new(file)))),
        DumpFormat::Yaml => Ok(Box::new(PoolInventoryDecoder::from_reader(file)?)),
    }
}
