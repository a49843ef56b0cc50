//! Error types for package verification
//!
//! Every failure the verifier can produce is a [`VerifyError`]. Callers that
//! need the coarse classification (configuration, I/O, trust, crypto) use
//! [`VerifyError::kind`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors that can occur while configuring or running a verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A required configuration value is missing or invalid.
    #[error("{0}")]
    Config(String),

    /// A repository configuration file could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    ConfigParse {
        /// Path to the offending file
        path: String,
        /// Parser diagnostic
        reason: String,
    },

    /// The configured signature type names no known verification mode.
    #[error("Signature type {0} is not supported for verification")]
    UnsupportedSignatureType(String),

    /// The selected repository did not resolve to exactly one definition.
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// The platform ABI string could not be determined.
    #[error("Failed to determine the system ABI: {0}")]
    Abi(String),

    /// Generic I/O failure while reading a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A named file could not be opened or read.
    #[error("Unable to open {path}: {source}")]
    FileOpen {
        /// Path of the file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The signature sidecar for a package does not exist or cannot be opened.
    #[error("Signature for file not available: {path}")]
    SignatureMissing {
        /// Expected sidecar path
        path: String,
    },

    /// The trusted fingerprint directory could not be read.
    #[error("Error loading trusted certificates from {path}: {reason}")]
    TrustStore {
        /// Directory that failed to load
        path: String,
        /// Details about the failure
        reason: String,
    },

    /// The trusted fingerprint directory loaded, but held no usable entries.
    #[error("No trusted certificates found in {path}")]
    NoTrustedCertificates {
        /// Directory that was scanned
        path: String,
    },

    /// The embedded certificate's digest is on the revoked list.
    #[error("The file was signed with revoked certificate {name}")]
    Revoked {
        /// Name of the revoked fingerprint entry
        name: String,
    },

    /// The embedded certificate's digest matched no trusted entry.
    #[error("No trusted fingerprint found matching file's certificate")]
    Untrusted {
        /// SHA-256 digest of the certificate that was looked up
        digest: String,
    },

    /// Public key material could not be parsed.
    #[error("Error reading public key: {reason}")]
    KeyLoad {
        /// Details from the key parser
        reason: String,
    },

    /// The signature does not verify against the key and digest.
    #[error("Signature is not valid: {reason}")]
    InvalidSignature {
        /// Details about the failure
        reason: String,
    },
}

/// Coarse classification of a [`VerifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration
    Configuration,
    /// A package, sidecar, key or trust directory could not be read
    Io,
    /// The signing certificate is revoked or not trusted
    Trust,
    /// Key material or signature verification failed
    Crypto,
}

impl VerifyError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::UnsupportedSignatureType(_)
            | Self::RepositoryNotFound(_)
            | Self::Abi(_) => ErrorKind::Configuration,
            Self::Io(_)
            | Self::FileOpen { .. }
            | Self::SignatureMissing { .. }
            | Self::TrustStore { .. } => ErrorKind::Io,
            Self::Revoked { .. } | Self::Untrusted { .. } | Self::NoTrustedCertificates { .. } => {
                ErrorKind::Trust
            }
            Self::KeyLoad { .. } | Self::InvalidSignature { .. } => ErrorKind::Crypto,
        }
    }
}
