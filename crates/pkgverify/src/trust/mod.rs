//! Package signature trust primitives
//!
//! This module provides the building blocks used by [`crate::verify`] to
//! decide whether a package archive may be installed.
//!
//! # Architecture
//!
//! ```text
//! PUBKEY:        package + .pubkeysig --> signature verify (configured key) --> allow/deny
//! FINGERPRINTS:  package + .sig --> envelope --> cert digest --> revoked? --> trusted? --> signature verify (cert) --> allow/deny
//! ```
//!
//! # Components
//!
//! - **Digest** ([`digest`]): SHA-256 hex digests of buffers and seekable streams
//! - **Envelope** ([`envelope`]): `SIGNATURE`/`CERT`/`END` sidecar parsing
//! - **Store** ([`store`]): trusted/revoked fingerprint directories
//! - **Signature** ([`signature`]): OpenSSL digest-verify over the hex digest text
//! - **Types** ([`types`]): records, signature material, mode selector, context
//!
//! # Security
//!
//! - Revocation is checked before trust and always wins
//! - Trust is keyed on the embedded certificate's digest, never the package's
//! - A missing or empty trusted directory fails closed

pub mod digest;
pub mod envelope;
pub mod signature;
pub mod store;
pub mod types;

pub use digest::{bytes_digest, file_digest, stream_digest};
pub use envelope::{parse_envelope, parse_envelope_file};
pub use signature::{verify_digest_hex, verify_signature, KeySource};
pub use store::{TrustStore, REVOKED_DIR, TRUSTED_DIR};
pub use types::{
    FingerprintRecord, HashAlgorithm, PublicKeySignature, SignatureType, SignedCertificate,
    VerifyContext,
};
