//! Decoder for the line-oriented backup-log dump.
//!
//! Each line is a whitespace-tokenized fixed-position record. The
//! record identifier sits at token 5; token 7 must start with `-si=`
//! and carries a `;`-delimited `key=value` sub-record with the path,
//! ownership, size, checksum flag, storage class, and HSM name.

use std::collections::HashMap;
use std::io::BufRead;

use crate::models::entry::{parse_checksum, parse_storage_group, uint_or_zero, FileEntry};

const RECORD_ID_TOKEN: usize = 5;
const SUBRECORD_TOKEN: usize = 7;
const SUBRECORD_PREFIX: &str = "-si=";

pub struct BackupLogDecoder<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> BackupLogDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for BackupLogDecoder<R> {
    type Item = std::io::Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                // A read failure is not a record defect; the dump is
                // truncated and the run must not report success.
                Err(e) => return Some(Err(e)),
            };
            self.line_no += 1;

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() <= SUBRECORD_TOKEN {
                if !tokens.is_empty() {
                    tracing::warn!(
                        "line {}: {} tokens, expected at least {}, skipping",
                        self.line_no,
                        tokens.len(),
                        SUBRECORD_TOKEN + 1
                    );
                }
                continue;
            }

            let Some(subrecord) = tokens[SUBRECORD_TOKEN].strip_prefix(SUBRECORD_PREFIX) else {
                tracing::warn!(
                    "line {}: token {} lacks the {} marker, skipping",
                    self.line_no,
                    SUBRECORD_TOKEN,
                    SUBRECORD_PREFIX
                );
                continue;
            };
            tracing::debug!("line {}: {:?}", self.line_no, tokens);

            let si: HashMap<&str, &str> = subrecord
                .split(';')
                .filter_map(|kv| kv.split_once('='))
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
                .collect();

            return Some(Ok(FileEntry {
                record_id: tokens[RECORD_ID_TOKEN].to_string(),
                path: si.get("path").map(|s| s.to_string()),
                uid: uint_or_zero(si.get("uid").copied()),
                gid: uint_or_zero(si.get("gid").copied()),
                size: uint_or_zero(si.get("size").copied()),
                checksum: si.get("flag-c").and_then(|raw| parse_checksum(raw)),
                storage_group: si.get("sClass").and_then(|raw| parse_storage_group(raw)),
                hsm: si.get("hsm").map(|s| s.to_string()),
            }));
        }
    }
}
