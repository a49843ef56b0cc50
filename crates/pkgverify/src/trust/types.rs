//! Core types for package signature verification
//!
//! Defines fingerprint records, the signature material carried by the two
//! sidecar formats, the verification mode selector and the per-call context.

use serde::{Deserialize, Serialize};

use super::digest::is_sha256_hex;

/// Hash function declared by a fingerprint entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256, the only supported function
    Sha256,
    /// Any other declared function, kept for diagnostics
    Unsupported(String),
}

impl HashAlgorithm {
    /// Parse a declared hash function name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("sha256") {
            Self::Sha256
        } else {
            Self::Unsupported(name.to_string())
        }
    }
}

/// A trusted or revoked certificate fingerprint.
///
/// `name` is the file name of the trust store entry it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    name: String,
    algorithm: HashAlgorithm,
    digest_hex: String,
}

impl FingerprintRecord {
    /// Build a SHA-256 record, normalising the digest to lowercase.
    ///
    /// Returns `None` unless `digest_hex` is exactly 64 hex digits.
    #[must_use]
    pub fn sha256(name: impl Into<String>, digest_hex: &str) -> Option<Self> {
        let digest_hex = digest_hex.trim();
        if !is_sha256_hex(digest_hex) {
            return None;
        }
        Some(Self {
            name: name.into(),
            algorithm: HashAlgorithm::Sha256,
            digest_hex: digest_hex.to_ascii_lowercase(),
        })
    }

    /// Entry name (file name in the trust store).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared hash function.
    #[must_use]
    pub fn algorithm(&self) -> &HashAlgorithm {
        &self.algorithm
    }

    /// Lowercase hex digest.
    #[must_use]
    pub fn digest_hex(&self) -> &str {
        &self.digest_hex
    }

    /// Case-insensitive comparison against a hex digest.
    #[must_use]
    pub fn matches(&self, digest_hex: &str) -> bool {
        self.digest_hex.eq_ignore_ascii_case(digest_hex)
    }
}

/// Signature and embedded certificate extracted from a `.sig` envelope.
///
/// Starts out untrusted. [`SignedCertificate::mark_trusted`] is the only
/// transition, and it records which trust entry vouched for the certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificate {
    signature: Vec<u8>,
    certificate: Vec<u8>,
    trusted: bool,
    matched_name: Option<String>,
}

impl SignedCertificate {
    /// Wrap raw signature and certificate bytes. Always untrusted.
    #[must_use]
    pub fn new(signature: Vec<u8>, certificate: Vec<u8>) -> Self {
        Self {
            signature,
            certificate,
            trusted: false,
            matched_name: None,
        }
    }

    /// Raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Raw certificate (public key PEM) bytes, byte-exact.
    #[must_use]
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    /// Whether a trusted, non-revoked fingerprint matched the certificate.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Name of the trust entry that matched, if any.
    #[must_use]
    pub fn matched_name(&self) -> Option<&str> {
        self.matched_name.as_deref()
    }

    /// Mark the certificate as trusted by `record`.
    ///
    /// Has no effect if the certificate is already trusted: the first match
    /// wins and its name is kept.
    pub fn mark_trusted(&mut self, record: &FingerprintRecord) {
        if self.trusted {
            return;
        }
        self.trusted = true;
        self.matched_name = Some(record.name().to_string());
    }
}

/// Raw signature read from a `.pubkeysig` sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeySignature {
    signature: Vec<u8>,
}

impl PublicKeySignature {
    /// Wrap raw signature bytes.
    #[must_use]
    pub fn new(signature: Vec<u8>) -> Self {
        Self { signature }
    }

    /// Raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Verification mode selected by the `SIGNATURE_TYPE` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureType {
    /// Signing disabled by policy: accept without checks
    None,
    /// Embedded certificate checked against the fingerprint trust store
    Fingerprints,
    /// Raw signature checked against the configured public key
    Pubkey,
    /// Anything else, kept for the diagnostic
    Unknown(String),
}

impl SignatureType {
    /// Parse a configured signature type (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("NONE") {
            Self::None
        } else if value.eq_ignore_ascii_case("FINGERPRINTS") {
            Self::Fingerprints
        } else if value.eq_ignore_ascii_case("PUBKEY") {
            Self::Pubkey
        } else {
            Self::Unknown(value.to_string())
        }
    }
}

/// Per-invocation verification options.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyContext {
    /// Suppress human-readable progress output
    pub quiet: bool,
}

impl VerifyContext {
    /// Context with progress output enabled or disabled.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}
