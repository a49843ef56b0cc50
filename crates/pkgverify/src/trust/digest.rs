//! SHA-256 digest computation for packages and certificates
//!
//! Provides hex-encoded SHA-256 digests of byte slices and seekable streams.
//! The package digest is what gets signed; the certificate digest is the
//! fingerprint used as the trust store lookup key.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Chunk size for streaming reads.
const CHUNK_SIZE: usize = 8192;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Compute the SHA-256 hex digest of a byte slice.
#[must_use]
pub fn bytes_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the SHA-256 hex digest of a seekable stream.
///
/// The stream is rewound to offset 0, read in 8 KiB chunks, and rewound to
/// offset 0 again afterwards so the caller can re-read it. The rewind is
/// attempted even when a read fails.
///
/// # Errors
///
/// Returns `VerifyError::Io` if any seek or read fails.
pub fn stream_digest<S: Read + Seek>(stream: &mut S) -> Result<String> {
    stream.seek(SeekFrom::Start(0))?;
    let hashed = hash_chunks(stream);
    let rewound = stream.seek(SeekFrom::Start(0));
    let digest = hashed?;
    rewound?;
    Ok(digest)
}

/// Compute the SHA-256 hex digest of an open file.
///
/// Reads through a duplicate of the handle, so `file` stays open and usable.
/// The duplicate shares the file offset, which is left at 0.
///
/// # Errors
///
/// Returns `VerifyError::Io` if the handle cannot be duplicated or read.
pub fn file_digest(file: &File) -> Result<String> {
    let mut cursor = file.try_clone()?;
    stream_digest(&mut cursor)
}

fn hash_chunks<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Whether `s` looks like a SHA-256 hex digest (any case).
#[must_use]
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
