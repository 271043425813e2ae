//! Canonical representation of one dump record.
//!
//! Both dump decoders normalize into `FileEntry`; the restoration
//! engine never sees a raw record. Field conversions are deliberately
//! lenient: a numeric field that does not parse becomes 0, an optional
//! field that does not match its expected shape is dropped. Only a
//! missing path makes a record unusable, and that is the engine's
//! call, not the decoder's.

/// A verified content checksum carried over from the source system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: u32,
    pub digest: String,
}

/// Storage-class binding for HSM re-attachment (backup-log dumps only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageGroup {
    pub store_class: String,
    pub group: String,
}

/// One file to be restored into the namespace.
#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    /// Stable identifier the object must be created under in the store.
    pub record_id: String,
    /// Absolute target path; a record without one is rejected.
    pub path: Option<String>,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub checksum: Option<Checksum>,
    pub storage_group: Option<StorageGroup>,
    /// Name of the HSM endpoint holding the content (backup-log dumps only).
    pub hsm: Option<String>,
}

/// Lenient numeric conversion: missing or unparseable fields become 0.
pub fn uint_or_zero<T>(raw: Option<&str>) -> T
where
    T: std::str::FromStr + Default,
{
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or_default()
}

/// Parse a raw checksum flag of the form `<algorithm>:<digest>`.
///
/// Anything other than exactly two colon-separated parts with a
/// numeric algorithm is dropped, not an error.
pub fn parse_checksum(raw: &str) -> Option<Checksum> {
    let mut parts = raw.split(':');
    let algorithm = parts.next()?.trim().parse().ok()?;
    let digest = parts.next()?.trim();
    if digest.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(Checksum {
        algorithm,
        digest: digest.to_string(),
    })
}

/// Parse a storage-class field of the form `<store_class>:<group>`.
pub fn parse_storage_group(raw: &str) -> Option<StorageGroup> {
    let mut parts = raw.split(':');
    let store_class = parts.next()?.trim();
    let group = parts.next()?.trim();
    if store_class.is_empty() || group.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(StorageGroup {
        store_class: store_class.to_string(),
        group: group.to_string(),
    })
}
