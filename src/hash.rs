//! Content fingerprinting
//!
//! Streams files through SHA-256 in fixed-size blocks so memory use stays
//! flat regardless of file size. The store reports the same digest as each
//! object's etag, which makes change detection a string comparison.

use crate::error::LongshoreResult;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read block size for streaming hashes.
pub const HASH_BLOCK_SIZE: usize = 10_240;

/// Hex SHA-256 digest of a file's content.
///
/// Identical bytes always produce identical digests; any difference in
/// content produces a different digest. Unreadable files surface the
/// underlying IO error.
pub fn hash_file(path: &Path) -> LongshoreResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; HASH_BLOCK_SIZE];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
