//! On-disk record format and per-validator filename convention.
//!
//! One file per validator lives under the data directory, named as the
//! lowercase hex encoding of the 48-byte BLS public key plus a `.json`
//! suffix. The file holds a newline-delimited stream of JSON `Record`
//! objects — append-friendly, and trivially resumable on partial writes
//! (a truncated trailing line simply fails to parse and is treated as the
//! end of the stream during `load`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{VoteAddress, VoteEnvelope};

/// `lowercase-hex(48 bytes)` is 96 characters; with the `.json` suffix the
/// full filename is 101 characters. (The distilled spec this crate follows
/// states "53 characters" for this filename; that figure does not square
/// with a 48-byte hex encoding plus a 5-character suffix, so this
/// implementation uses the length implied by the stated encoding rather
/// than the literal figure — see DESIGN.md.)
pub const FILENAME_LEN: usize = 48 * 2 + 5;

pub const FILE_SUFFIX: &str = ".json";

/// A single persisted `(height, envelope)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub height: u64,
    pub envelope: VoteEnvelope,
}

/// Build the per-validator file path under `dir`.
pub fn file_path(dir: &std::path::Path, validator: &VoteAddress) -> PathBuf {
    dir.join(format!("{}{}", hex::encode(validator.as_slice()), FILE_SUFFIX))
}

/// Parse a validator key back out of a filename, if it matches the
/// expected shape (length + suffix + valid hex).
pub fn validator_from_filename(name: &str) -> Option<VoteAddress> {
    if name.len() != FILENAME_LEN || !name.ends_with(FILE_SUFFIX) {
        return None;
    }
    let hex_part = &name[..name.len() - FILE_SUFFIX.len()];
    let bytes = hex::decode(hex_part).ok()?;
    if bytes.len() != 48 {
        return None;
    }
    Some(VoteAddress::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn filename_round_trips() {
        let v = VoteAddress::repeat_byte(0x42);
        let path = file_path(Path::new("/tmp/data"), &v);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), FILENAME_LEN);
        assert_eq!(validator_from_filename(name), Some(v));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(validator_from_filename("deadbeef.json"), None);
    }

    #[test]
    fn wrong_suffix_is_rejected() {
        let v = VoteAddress::repeat_byte(0x11);
        let name = format!("{}.txt", hex::encode(v.as_slice()));
        assert_eq!(validator_from_filename(&name), None);
    }
}
