//! End-to-end verification scenarios against on-disk fixtures.

#![allow(clippy::unwrap_used)]

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer;
use pkgverify::trust::{bytes_digest, SignedCertificate, VerifyContext};
use pkgverify::verify::verify_pubkey;
use pkgverify::{verify_package, Config, ConfigKey, ErrorKind, RepoSettings, VerifyError};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const QUIET: VerifyContext = VerifyContext { quiet: true };
const PACKAGE: &[u8] = b"pkg archive: foo-1.0 with some payload bytes";

struct Fixture {
    dir: TempDir,
    key: PKey<Private>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            key: PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cert(&self) -> Vec<u8> {
        self.key.public_key_to_pem().unwrap()
    }

    fn sign(&self, content: &[u8]) -> Vec<u8> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.key).unwrap();
        signer.update(bytes_digest(content).as_bytes()).unwrap();
        signer.sign_to_vec().unwrap()
    }

    fn write_package(&self) -> PathBuf {
        let pkg = self.path("foo-1.0.pkg");
        fs::write(&pkg, PACKAGE).unwrap();
        pkg
    }

    fn write_envelope(&self, pkg: &Path, signed_content: &[u8]) {
        let sc = SignedCertificate::new(self.sign(signed_content), self.cert());
        fs::write(format!("{}.sig", pkg.display()), sc.to_envelope()).unwrap();
    }

    fn write_fingerprint(&self, set: &str, name: &str, digest: &str) -> PathBuf {
        let root = self.path("fingerprints");
        let dir = root.join(set);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(name),
            format!("function: \"sha256\"\nfingerprint: \"{digest}\"\n"),
        )
        .unwrap();
        root
    }
}

fn config(pairs: &[(ConfigKey, &str)]) -> HashMap<ConfigKey, String> {
    pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
}

// ---------------------------------------------------------------------------
// NONE and configuration
// ---------------------------------------------------------------------------

#[test]
fn none_accepts_missing_package_and_sidecars() {
    let fx = Fixture::new();
    let cfg = config(&[(ConfigKey::SignatureType, "NONE")]);
    verify_package(&QUIET, &cfg, &fx.path("absent.pkg")).unwrap();
}

#[test]
fn unset_signature_type_is_configuration_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let err = verify_package(&QUIET, &config(&[]), &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("Signature type disabled"));
}

#[test]
fn fingerprints_without_root_is_configuration_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let cfg = config(&[(ConfigKey::SignatureType, "FINGERPRINTS")]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ---------------------------------------------------------------------------
// FINGERPRINTS
// ---------------------------------------------------------------------------

#[test]
fn fingerprints_trusted_certificate_verifies() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let root = fx.write_fingerprint("trusted", "repo-2024", &bytes_digest(&fx.cert()));

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    verify_package(&QUIET, &cfg, &pkg).unwrap();
}

#[test]
fn fingerprints_missing_sidecar_is_io_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let root = fx.write_fingerprint("trusted", "repo", &bytes_digest(&fx.cert()));

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert!(matches!(err, VerifyError::SignatureMissing { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn fingerprints_untrusted_certificate_is_trust_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let root = fx.write_fingerprint("trusted", "someone-else", &bytes_digest(b"other cert"));

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Trust);
    assert!(err
        .to_string()
        .contains("No trusted fingerprint found matching file's certificate"));
}

#[test]
fn fingerprints_revocation_overrides_trust() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let digest = bytes_digest(&fx.cert());
    fx.write_fingerprint("trusted", "repo-2023", &digest);
    let root = fx.write_fingerprint("revoked", "repo-2023-leaked", &digest);

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Trust);
    assert_eq!(
        err.to_string(),
        "The file was signed with revoked certificate repo-2023-leaked"
    );
}

#[test]
fn fingerprints_trust_keys_on_certificate_not_package() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    // Trusting the package digest must not make the certificate trusted.
    let root = fx.write_fingerprint("trusted", "package-digest", &bytes_digest(PACKAGE));

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert!(matches!(err, VerifyError::Untrusted { .. }));
}

#[test]
fn fingerprints_trusted_certificate_with_bad_signature_is_crypto_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, b"a different package");
    let root = fx.write_fingerprint("trusted", "repo", &bytes_digest(&fx.cert()));

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
}

#[test]
fn fingerprints_empty_trusted_dir_fails_closed() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let root = fx.path("fingerprints");
    fs::create_dir_all(root.join("trusted")).unwrap();

    let cfg = config(&[
        (ConfigKey::SignatureType, "FINGERPRINTS"),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert!(matches!(err, VerifyError::NoTrustedCertificates { .. }));
}

// ---------------------------------------------------------------------------
// PUBKEY
// ---------------------------------------------------------------------------

#[test]
fn pubkey_valid_signature_verifies() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let key_path = fx.path("repo.pub");
    fs::write(&key_path, fx.cert()).unwrap();
    fs::write(fx.path("foo-1.0.pkg.pubkeysig"), fx.sign(PACKAGE)).unwrap();

    let cfg = config(&[
        (ConfigKey::SignatureType, "PUBKEY"),
        (ConfigKey::Pubkey, key_path.to_str().unwrap()),
    ]);
    verify_package(&QUIET, &cfg, &pkg).unwrap();
}

#[test]
fn pubkey_bad_signature_is_crypto_error() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let key_path = fx.path("repo.pub");
    fs::write(&key_path, fx.cert()).unwrap();
    fs::write(fx.path("foo-1.0.pkg.pubkeysig"), fx.sign(b"tampered")).unwrap();

    let cfg = config(&[
        (ConfigKey::SignatureType, "PUBKEY"),
        (ConfigKey::Pubkey, key_path.to_str().unwrap()),
    ]);
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
    // The package is left untouched on disk.
    assert_eq!(fs::read(&pkg).unwrap(), PACKAGE);
}

#[test]
fn pubkey_bad_signature_leaves_package_at_start() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let key_path = fx.path("repo.pub");
    fs::write(&key_path, fx.cert()).unwrap();
    let sig_path = fx.path("foo-1.0.pkg.pubkeysig");
    fs::write(&sig_path, fx.sign(b"tampered")).unwrap();

    let mut package = File::open(&pkg).unwrap();
    package.seek(SeekFrom::Start(7)).unwrap();
    let sidecar = File::open(&sig_path).unwrap();

    let cfg = config(&[(ConfigKey::Pubkey, key_path.to_str().unwrap())]);
    let err = verify_pubkey(&QUIET, &cfg, &package, &sidecar).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
    assert_eq!(package.stream_position().unwrap(), 0);
}

#[test]
fn pubkey_ignores_revocation_lists() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    let key_path = fx.path("repo.pub");
    fs::write(&key_path, fx.cert()).unwrap();
    fs::write(fx.path("foo-1.0.pkg.pubkeysig"), fx.sign(PACKAGE)).unwrap();
    let root = fx.write_fingerprint("revoked", "repo", &bytes_digest(&fx.cert()));

    let cfg = config(&[
        (ConfigKey::SignatureType, "PUBKEY"),
        (ConfigKey::Pubkey, key_path.to_str().unwrap()),
        (ConfigKey::Fingerprints, root.to_str().unwrap()),
    ]);
    verify_package(&QUIET, &cfg, &pkg).unwrap();
}

// ---------------------------------------------------------------------------
// Repository configuration
// ---------------------------------------------------------------------------

#[test]
fn repository_config_drives_verification() {
    let fx = Fixture::new();
    let pkg = fx.write_package();
    fx.write_envelope(&pkg, PACKAGE);
    let root = fx.write_fingerprint("trusted", "repo", &bytes_digest(&fx.cert()));

    let repos_dir = fx.path("repos");
    fs::create_dir_all(&repos_dir).unwrap();
    let repo = RepoSettings {
        url: Some("https://pkg.example.org/latest".to_string()),
        enabled: Some(true),
        signature_type: Some("fingerprints".to_string()),
        fingerprints: Some(root.to_str().unwrap().to_string()),
        pubkey: None,
    };
    let doc = serde_json::json!({ "default": repo });
    fs::write(repos_dir.join("default.json"), doc.to_string()).unwrap();

    let cfg = Config::init(&[&repos_dir], Some("default")).unwrap();
    assert_eq!(cfg.repo_count(), 1);
    verify_package(&QUIET, &cfg, &pkg).unwrap();

    // An override replaces the repository's mode.
    let cfg = cfg.with_override(ConfigKey::SignatureType, "pubkey");
    let err = verify_package(&QUIET, &cfg, &pkg).unwrap_err();
    assert!(matches!(err, VerifyError::SignatureMissing { .. }));
}
