//! Package verification entry point
//!
//! Selects the verification mode from `SIGNATURE_TYPE` and runs it:
//!
//! 1. `NONE`: accept without opening anything
//! 2. `FINGERPRINTS`: `<package>.sig` envelope, trust store, embedded certificate
//! 3. `PUBKEY`: `<package>.pubkeysig` raw signature, configured public key
//!
//! An unset or unknown signature type is a configuration error. No step is
//! skipped on failure: the first failing check ends the run.

use crate::config::{ConfigKey, ConfigSource};
use crate::error::{Result, VerifyError};
use crate::trust::{
    bytes_digest, parse_envelope_file, verify_signature, KeySource, PublicKeySignature,
    SignatureType, SignedCertificate, TrustStore, VerifyContext,
};
use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Sidecar suffix for `FINGERPRINTS` envelopes.
pub const FINGERPRINTS_SUFFIX: &str = ".sig";

/// Sidecar suffix for `PUBKEY` raw signatures.
pub const PUBKEY_SUFFIX: &str = ".pubkeysig";

/// Verify the package at `package` according to `config`.
///
/// `SIGNATURE_TYPE` is read before any file is touched.
///
/// # Errors
///
/// Returns the first failing check as a [`VerifyError`]; use
/// [`VerifyError::kind`] to classify it.
pub fn verify_package<C: ConfigSource + ?Sized>(
    ctx: &VerifyContext,
    config: &C,
    package: &Path,
) -> Result<()> {
    let signature_type = config
        .string(ConfigKey::SignatureType)
        .map(SignatureType::parse)
        .ok_or_else(|| {
            VerifyError::Config(
                "Signature type disabled is not supported for verification".to_string(),
            )
        })?;

    match signature_type {
        SignatureType::None => {
            tracing::debug!("signature checking disabled, accepting {}", package.display());
            Ok(())
        }
        SignatureType::Fingerprints => {
            let (package_file, sidecar) = open_package(package, FINGERPRINTS_SUFFIX)?;
            verify_fingerprints(ctx, config, &package_file, &sidecar)
        }
        SignatureType::Pubkey => {
            let (package_file, sidecar) = open_package(package, PUBKEY_SUFFIX)?;
            verify_pubkey(ctx, config, &package_file, &sidecar)
        }
        SignatureType::Unknown(other) => Err(VerifyError::UnsupportedSignatureType(other)),
    }
}

/// Verify against the embedded certificate and the fingerprint trust store.
///
/// # Errors
///
/// Returns `VerifyError::Config` if `FINGERPRINTS` is unset, trust store
/// errors from [`TrustStore::load`], `VerifyError::Revoked` or
/// `VerifyError::Untrusted` on a trust decision, or signature errors.
pub fn verify_fingerprints<C: ConfigSource + ?Sized>(
    ctx: &VerifyContext,
    config: &C,
    package: &File,
    sidecar: &File,
) -> Result<()> {
    let root = config
        .string(ConfigKey::Fingerprints)
        .ok_or_else(|| VerifyError::Config("No CONFIG_FINGERPRINTS defined".to_string()))?;
    let store = TrustStore::load(root)?;

    let mut sc = parse_envelope_file(sidecar)?;
    check_trust(&store, &mut sc)?;

    let name = sc.matched_name().unwrap_or_default();
    verify_signature(
        ctx,
        package,
        sc.signature(),
        KeySource::Certificate {
            name,
            pem: sc.certificate(),
        },
    )
}

/// Decide whether the envelope's certificate is trusted.
///
/// The lookup key is the SHA-256 of the certificate bytes. Revocation is
/// checked first and overrides any trusted entry for the same digest.
///
/// # Errors
///
/// Returns `VerifyError::Revoked` naming the revoked entry, or
/// `VerifyError::Untrusted` if no trusted entry matches.
pub fn check_trust(store: &TrustStore, sc: &mut SignedCertificate) -> Result<()> {
    let digest = bytes_digest(sc.certificate());

    if let Some(revoked) = store.is_revoked(&digest) {
        return Err(VerifyError::Revoked {
            name: revoked.name().to_string(),
        });
    }

    match store.find_trusted(&digest) {
        Some(record) => {
            sc.mark_trusted(record);
            tracing::debug!("certificate {digest} trusted by {}", record.name());
            Ok(())
        }
        None => Err(VerifyError::Untrusted { digest }),
    }
}

/// Verify a raw signature against the configured public key.
///
/// # Errors
///
/// Returns `VerifyError::Config` if `PUBKEY` is unset, `VerifyError::Io` if
/// the sidecar cannot be read, or signature errors.
pub fn verify_pubkey<C: ConfigSource + ?Sized>(
    ctx: &VerifyContext,
    config: &C,
    package: &File,
    sidecar: &File,
) -> Result<()> {
    let pubkey = config
        .string(ConfigKey::Pubkey)
        .ok_or_else(|| VerifyError::Config("No CONFIG_PUBKEY defined".to_string()))?;

    let pk = read_pubkey_signature(sidecar)?;
    verify_signature(ctx, package, pk.signature(), KeySource::File(Path::new(pubkey)))
}

/// Read the whole `.pubkeysig` sidecar as raw signature bytes.
fn read_pubkey_signature(sidecar: &File) -> Result<PublicKeySignature> {
    let mut cursor = sidecar.try_clone()?;
    cursor.seek(SeekFrom::Start(0))?;
    let mut signature = Vec::new();
    cursor.read_to_end(&mut signature)?;
    cursor.seek(SeekFrom::Start(0))?;
    Ok(PublicKeySignature::new(signature))
}

/// `<package><suffix>`, appended to the full file name.
#[must_use]
pub fn sidecar_path(package: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = package.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Open the package, then its `<package><suffix>` sidecar.
fn open_package(package: &Path, suffix: &str) -> Result<(File, File)> {
    let package_file = open_file(package)?;
    let sidecar = open_sidecar(&sidecar_path(package, suffix))?;
    Ok((package_file, sidecar))
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| VerifyError::FileOpen {
        path: path.display().to_string(),
        source: e,
    })
}

fn open_sidecar(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        tracing::debug!("cannot open {}: {e}", path.display());
        VerifyError::SignatureMissing {
            path: path.display().to_string(),
        }
    })
}
