//! Package signature verification
//!
//! Decides whether a package archive may be installed, based on the
//! repository's `SIGNATURE_TYPE`:
//!
//! - `NONE`: every package is accepted
//! - `PUBKEY`: `<package>.pubkeysig` must verify under the configured key
//! - `FINGERPRINTS`: `<package>.sig` carries a signature and a certificate;
//!   the certificate's SHA-256 must appear in the trusted fingerprint
//!   directory and not in the revoked one, and the signature must verify
//!   under that certificate
//!
//! Signatures cover the lowercase hex text of the package's SHA-256 digest.
//!
//! ```no_run
//! use pkgverify::{verify_package, Config, VerifyContext};
//! use std::path::Path;
//!
//! # fn main() -> pkgverify::Result<()> {
//! let config = Config::init(&pkgverify::config::default_repos_dirs(), Some("default"))?
//!     .with_env_overrides();
//! verify_package(&VerifyContext::default(), &config, Path::new("foo-1.0.pkg"))?;
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod config;
pub mod error;
pub mod trust;
pub mod verify;

pub use config::{Config, ConfigKey, ConfigSource, RepoSettings};
pub use error::{ErrorKind, Result, VerifyError};
pub use trust::VerifyContext;
pub use verify::verify_package;
