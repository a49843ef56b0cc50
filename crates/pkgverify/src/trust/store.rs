//! Fingerprint trust store loading and lookup
//!
//! A trust store root holds two directories of fingerprint entries:
//!
//! ```text
//! <root>/trusted/<name>   certificates allowed to sign packages
//! <root>/revoked/<name>   certificates that must be rejected
//! ```
//!
//! Each entry is a small key-value document naming the hash function and the
//! certificate fingerprint:
//!
//! ```text
//! function: "sha256"
//! fingerprint: "3f1c...e9"
//! ```
//!
//! # Loading rules
//!
//! - `trusted` must be readable and yield at least one entry
//! - `revoked` is optional: an unreadable directory is an empty set
//! - Entries missing `function` or `fingerprint` are skipped quietly
//! - Unsupported hash functions and malformed entries are skipped with a warning
//!
//! The store is rebuilt from disk for every verification and never cached.

use crate::error::{Result, VerifyError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::{FingerprintRecord, HashAlgorithm};

/// Subdirectory holding trusted fingerprints.
pub const TRUSTED_DIR: &str = "trusted";

/// Subdirectory holding revoked fingerprints.
pub const REVOKED_DIR: &str = "revoked";

/// Trusted and revoked fingerprint sets loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    trusted: Vec<FingerprintRecord>,
    revoked: Vec<FingerprintRecord>,
}

impl TrustStore {
    /// Build a store from already-parsed records.
    #[must_use]
    pub fn new(trusted: Vec<FingerprintRecord>, revoked: Vec<FingerprintRecord>) -> Self {
        Self { trusted, revoked }
    }

    /// Load `<root>/trusted` and `<root>/revoked`.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::TrustStore` if the trusted directory cannot be
    /// read, or `VerifyError::NoTrustedCertificates` if it holds no usable
    /// entries.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();

        let trusted_path = root.join(TRUSTED_DIR);
        let trusted = load_fingerprints(&trusted_path).map_err(|e| VerifyError::TrustStore {
            path: trusted_path.display().to_string(),
            reason: e.to_string(),
        })?;
        if trusted.is_empty() {
            return Err(VerifyError::NoTrustedCertificates {
                path: trusted_path.display().to_string(),
            });
        }

        let revoked_path = root.join(REVOKED_DIR);
        let revoked = match load_fingerprints(&revoked_path) {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!(
                    "no revoked fingerprints at {}: {e}",
                    revoked_path.display()
                );
                Vec::new()
            }
        };

        tracing::debug!(
            "loaded {} trusted and {} revoked fingerprints from {}",
            trusted.len(),
            revoked.len(),
            root.display()
        );

        Ok(Self { trusted, revoked })
    }

    /// Return the revoked entry matching `digest_hex`, if any.
    #[must_use]
    pub fn is_revoked(&self, digest_hex: &str) -> Option<&FingerprintRecord> {
        self.revoked.iter().find(|r| r.matches(digest_hex))
    }

    /// Return the trusted entry matching `digest_hex`, if any.
    ///
    /// Does not consult the revoked set; callers check [`Self::is_revoked`]
    /// first.
    #[must_use]
    pub fn find_trusted(&self, digest_hex: &str) -> Option<&FingerprintRecord> {
        self.trusted.iter().find(|r| r.matches(digest_hex))
    }

    /// Trusted records, in file name order.
    #[must_use]
    pub fn trusted(&self) -> &[FingerprintRecord] {
        &self.trusted
    }

    /// Revoked records, in file name order.
    #[must_use]
    pub fn revoked(&self) -> &[FingerprintRecord] {
        &self.revoked
    }
}

/// Load every fingerprint entry in a directory.
///
/// Fails only if the directory itself cannot be listed. Individual entries
/// that cannot be read or parsed are skipped.
fn load_fingerprints(dir: &Path) -> std::io::Result<Vec<FingerprintRecord>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // stat, not lstat: a symlinked entry counts as a file.
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => paths.push(path),
            Err(e) => {
                tracing::warn!("{}: {e}", path.display());
            }
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        if let Some(record) = load_fingerprint(path) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Load a single fingerprint entry, returning `None` if it must be skipped.
fn load_fingerprint(path: &Path) -> Option<FingerprintRecord> {
    let name = path.file_name()?.to_string_lossy().into_owned();

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("{}: {e}", path.display());
            return None;
        }
    };

    let fields = match parse_fingerprint_document(&content) {
        Ok(f) => f,
        Err(reason) => {
            tracing::warn!("{}: {reason}", path.display());
            return None;
        }
    };

    let (Some(function), Some(fingerprint)) = (fields.get("function"), fields.get("fingerprint"))
    else {
        tracing::debug!(
            "{}: missing function or fingerprint, skipping",
            path.display()
        );
        return None;
    };

    match HashAlgorithm::parse(function) {
        HashAlgorithm::Sha256 => {}
        HashAlgorithm::Unsupported(other) => {
            tracing::warn!("Unsupported hashing function: {other}");
            return None;
        }
    }

    let record = FingerprintRecord::sha256(name, fingerprint);
    if record.is_none() {
        tracing::warn!(
            "{}: fingerprint is not a 64-character hex SHA-256 digest",
            path.display()
        );
    }
    record
}

/// Parse a flat key-value fingerprint document.
///
/// Accepts a JSON object (string values only) or the UCL-style line syntax
/// used by fingerprint files: `key: "value"`, `key = value;`, `key "value"`,
/// with `#` and `//` comments and optional braces around the whole document.
/// Pairs are separated by newlines or by `,`/`;` outside quotes. Keys are
/// lowercased; the first occurrence of a key wins.
///
/// Returns an error string for input that is not a key-value document.
pub fn parse_fingerprint_document(content: &str) -> std::result::Result<HashMap<String, String>, String> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(trimmed) {
            let mut fields = HashMap::new();
            for (key, value) in map {
                if let serde_json::Value::String(s) = value {
                    fields.entry(key.to_ascii_lowercase()).or_insert(s);
                }
            }
            return Ok(fields);
        }
    }

    let mut body = String::with_capacity(content.len());
    for raw in content.lines() {
        body.push_str(strip_comment(raw));
        body.push('\n');
    }
    let body = body.trim();
    let body = body
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .unwrap_or(body);

    let mut fields = HashMap::new();
    for line in body.lines() {
        for pair in split_fields(line) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) =
                split_pair(pair).ok_or_else(|| format!("expected `key: value`, found `{pair}`"))?;
            let key = unquote(key.trim()).to_ascii_lowercase();
            if key.is_empty() {
                return Err(format!("empty key in `{pair}`"));
            }
            fields
                .entry(key)
                .or_insert_with(|| unquote(value.trim()).to_string());
        }
    }
    Ok(fields)
}

/// Split a line on `,` and `;` outside quotes.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    for (i, b) in line.bytes().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b',' | b';') => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Drop a trailing `#` or `//` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'#' if !in_quotes => return &line[..i],
            b'/' if !in_quotes && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split `key: value`, `key = value` or `key value`.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let sep = line.find([':', '=', ' ', '\t'])?;
    let (key, rest) = line.split_at(sep);
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('='))
        .unwrap_or(rest);
    Some((key, rest))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}
