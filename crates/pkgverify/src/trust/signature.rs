//! Signature verification over a package digest
//!
//! Signers sign the lowercase hex text of the package's SHA-256 digest, not
//! the raw 32-byte digest, using a SHA-256 digest-sign scheme. Verification
//! recomputes the hex digest from the package and checks the signature over
//! those 64 ASCII bytes.
//!
//! Keys are PEM `SubjectPublicKeyInfo` documents, read either from the
//! configured public key file or from the certificate embedded in a `.sig`
//! envelope. Any key type OpenSSL can digest-verify with SHA-256 (RSA
//! PKCS#1 v1.5, ECDSA) is accepted.

use crate::error::{Result, VerifyError};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Public};
use openssl::sign::Verifier;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::digest::file_digest;
use super::types::VerifyContext;

/// Where the verification key comes from.
#[derive(Debug, Clone, Copy)]
pub enum KeySource<'a> {
    /// PEM public key file configured for the repository
    File(&'a Path),
    /// PEM public key embedded in the signature envelope
    Certificate {
        /// Name of the trust entry that vouched for it
        name: &'a str,
        /// PEM bytes
        pem: &'a [u8],
    },
}

impl fmt::Display for KeySource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "public key {}", path.display()),
            Self::Certificate { name, .. } => write!(f, "trusted certificate {name}"),
        }
    }
}

impl KeySource<'_> {
    /// Parse the key.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::FileOpen` if a key file cannot be read, or
    /// `VerifyError::KeyLoad` if the PEM does not hold a public key.
    pub fn load(&self) -> Result<PKey<Public>> {
        match self {
            Self::File(path) => {
                let pem = std::fs::read(path).map_err(|e| VerifyError::FileOpen {
                    path: path.display().to_string(),
                    source: e,
                })?;
                parse_public_key(&pem)
            }
            Self::Certificate { pem, .. } => parse_public_key(pem),
        }
    }
}

fn parse_public_key(pem: &[u8]) -> Result<PKey<Public>> {
    PKey::public_key_from_pem(pem).map_err(|e| VerifyError::KeyLoad {
        reason: e.to_string(),
    })
}

/// Verify `signature` over the hex SHA-256 digest of `content`.
///
/// Prints `Verifying signature with <key>... done|failed` to stdout unless
/// `ctx.quiet`. The file offset of `content` is left at 0.
///
/// # Errors
///
/// Returns `VerifyError::Io` if the package cannot be hashed,
/// `VerifyError::FileOpen`/`VerifyError::KeyLoad` if the key cannot be
/// loaded, or `VerifyError::InvalidSignature` if the signature does not
/// verify.
pub fn verify_signature(
    ctx: &VerifyContext,
    content: &File,
    signature: &[u8],
    key: KeySource<'_>,
) -> Result<()> {
    progress(ctx, format_args!("Verifying signature with {key}... "));
    let result = check_signature(content, signature, &key);
    progress(
        ctx,
        format_args!("{}\n", if result.is_ok() { "done" } else { "failed" }),
    );
    result
}

fn check_signature(content: &File, signature: &[u8], key: &KeySource<'_>) -> Result<()> {
    let digest_hex = file_digest(content)?;
    let pkey = key.load()?;
    verify_digest_hex(&digest_hex, signature, &pkey)
}

/// Verify `signature` over the ASCII bytes of `digest_hex`.
///
/// # Errors
///
/// Returns `VerifyError::InvalidSignature` on mismatch, malformed signature
/// bytes, or a key type that cannot be used with SHA-256.
pub fn verify_digest_hex(digest_hex: &str, signature: &[u8], pkey: &PKey<Public>) -> Result<()> {
    let invalid = |e: openssl::error::ErrorStack| VerifyError::InvalidSignature {
        reason: e.to_string(),
    };
    let mut verifier = Verifier::new(MessageDigest::sha256(), pkey).map_err(invalid)?;
    verifier.update(digest_hex.as_bytes()).map_err(invalid)?;
    match verifier.verify(signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(VerifyError::InvalidSignature {
            reason: "signature does not match package digest".to_string(),
        }),
        Err(e) => Err(invalid(e)),
    }
}

fn progress(ctx: &VerifyContext, args: fmt::Arguments<'_>) {
    if ctx.quiet {
        return;
    }
    let mut stdout = std::io::stdout().lock();
    // Progress output is best effort.
    let _ = stdout.write_fmt(args);
    let _ = stdout.flush();
}
