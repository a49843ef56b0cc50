//! Repository configuration
//!
//! Repository definitions live in `*.json` files inside one or more repos
//! directories. Each file maps repository names to settings:
//!
//! ```json
//! {
//!   "default": {
//!     "url": "https://pkg.example.org/latest",
//!     "enabled": true,
//!     "signature_type": "fingerprints",
//!     "fingerprints": "/usr/local/etc/pkg/fingerprints/default"
//!   }
//! }
//! ```
//!
//! Directories are read in order and files in name order. A later definition
//! of the same repository overrides the fields it sets. Disabled repositories
//! are dropped after merging.
//!
//! The verifier reads settings through [`ConfigSource`], so callers can
//! supply their own configuration backend.

use crate::error::{Result, VerifyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

/// System-wide repos directory.
pub const SYSTEM_REPOS_DIR: &str = "/usr/local/etc/pkg/repos";

/// Environment variable holding a path list of repos directories.
pub const REPOS_DIR_ENV: &str = "PKG_REPOS_DIR";

/// Settings the verifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Verification mode (`NONE`, `FINGERPRINTS`, `PUBKEY`)
    SignatureType,
    /// Trust store root directory
    Fingerprints,
    /// Public key file path
    Pubkey,
}

impl ConfigKey {
    /// All keys, in a stable order.
    pub const ALL: [ConfigKey; 3] = [Self::SignatureType, Self::Fingerprints, Self::Pubkey];

    /// Canonical upper-case name, also used as the environment variable.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignatureType => "SIGNATURE_TYPE",
            Self::Fingerprints => "FINGERPRINTS",
            Self::Pubkey => "PUBKEY",
        }
    }
}

/// Read access to verification settings.
pub trait ConfigSource {
    /// Return the string value of `key`, if set.
    fn string(&self, key: ConfigKey) -> Option<&str>;
}

impl ConfigSource for HashMap<ConfigKey, String> {
    fn string(&self, key: ConfigKey) -> Option<&str> {
        self.get(&key).map(String::as_str)
    }
}

/// One repository definition. Every field is optional so that partial
/// definitions in later files can override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSettings {
    /// Package site URL
    #[serde(default, alias = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the repository is active (default: enabled)
    #[serde(default, alias = "ENABLED", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Verification mode
    #[serde(
        default,
        alias = "SIGNATURE_TYPE",
        skip_serializing_if = "Option::is_none"
    )]
    pub signature_type: Option<String>,
    /// Trust store root for `FINGERPRINTS`
    #[serde(
        default,
        alias = "FINGERPRINTS",
        skip_serializing_if = "Option::is_none"
    )]
    pub fingerprints: Option<String>,
    /// Public key file for `PUBKEY`
    #[serde(default, alias = "PUBKEY", skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
}

impl RepoSettings {
    /// Whether the repository is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Overlay the fields set in `other`.
    fn merge(&mut self, other: RepoSettings) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.signature_type.is_some() {
            self.signature_type = other.signature_type;
        }
        if other.fingerprints.is_some() {
            self.fingerprints = other.fingerprints;
        }
        if other.pubkey.is_some() {
            self.pubkey = other.pubkey;
        }
    }

    fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::SignatureType => self.signature_type.as_deref(),
            ConfigKey::Fingerprints => self.fingerprints.as_deref(),
            ConfigKey::Pubkey => self.pubkey.as_deref(),
        }
    }
}

/// Loaded repository configuration.
///
/// Settings are answered from the selected repository only when exactly one
/// enabled repository is loaded; explicit overrides always win.
#[derive(Debug, Clone, Default)]
pub struct Config {
    repos: BTreeMap<String, RepoSettings>,
    overrides: HashMap<ConfigKey, String>,
}

impl Config {
    /// Load repository definitions from `dirs`.
    ///
    /// With `repo` set, only that repository is kept. Missing directories
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::FileOpen` if a directory or file exists but
    /// cannot be read, or `VerifyError::ConfigParse` if a file is not a
    /// valid repository map.
    pub fn init<P: AsRef<Path>>(dirs: &[P], repo: Option<&str>) -> Result<Self> {
        let mut merged: BTreeMap<String, RepoSettings> = BTreeMap::new();
        for dir in dirs {
            for path in repo_files(dir.as_ref())? {
                for (name, settings) in load_repo_file(&path)? {
                    merged.entry(name).or_default().merge(settings);
                }
            }
        }
        Ok(Self::from_repos(merged, repo))
    }

    /// Build a configuration from in-memory definitions.
    #[must_use]
    pub fn from_repos<I>(repos: I, repo: Option<&str>) -> Self
    where
        I: IntoIterator<Item = (String, RepoSettings)>,
    {
        let repos = repos
            .into_iter()
            .filter(|(name, settings)| {
                settings.is_enabled() && repo.map_or(true, |wanted| wanted == name.as_str())
            })
            .collect();
        Self {
            repos,
            overrides: HashMap::new(),
        }
    }

    /// Force `key` to `value` regardless of repository settings.
    #[must_use]
    pub fn with_override(mut self, key: ConfigKey, value: impl Into<String>) -> Self {
        self.overrides.insert(key, value.into());
        self
    }

    /// Apply `SIGNATURE_TYPE`, `FINGERPRINTS` and `PUBKEY` from the
    /// environment as overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        for key in ConfigKey::ALL {
            if let Ok(value) = std::env::var(key.as_str()) {
                tracing::debug!("{} overridden from environment", key.as_str());
                self.overrides.insert(key, value);
            }
        }
        self
    }

    /// Number of enabled repositories loaded.
    #[must_use]
    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }

    /// Enabled repositories, in name order.
    pub fn repos(&self) -> impl Iterator<Item = (&str, &RepoSettings)> {
        self.repos.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Write a human-readable listing of the loaded repositories.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn print_repos<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (name, settings) in &self.repos {
            writeln!(out, "{name}:")?;
            writeln!(
                out,
                "  url          : {}",
                settings.url.as_deref().unwrap_or("-")
            )?;
            writeln!(
                out,
                "  enabled      : {}",
                if settings.is_enabled() { "yes" } else { "no" }
            )?;
            writeln!(
                out,
                "  signature    : {}",
                settings.signature_type.as_deref().unwrap_or("-")
            )?;
            if let Some(fp) = &settings.fingerprints {
                writeln!(out, "  fingerprints : {fp}")?;
            }
            if let Some(key) = &settings.pubkey {
                writeln!(out, "  pubkey       : {key}")?;
            }
        }
        Ok(())
    }
}

impl ConfigSource for Config {
    fn string(&self, key: ConfigKey) -> Option<&str> {
        if let Some(value) = self.overrides.get(&key) {
            return Some(value.as_str());
        }
        if self.repos.len() != 1 {
            return None;
        }
        self.repos.values().next().and_then(|s| s.get(key))
    }
}

/// Default repos directories.
///
/// `PKG_REPOS_DIR` (a path list) replaces the defaults when set. Otherwise
/// the system directory is read first, then `<config dir>/pkgverify/repos`.
#[must_use]
pub fn default_repos_dirs() -> Vec<PathBuf> {
    if let Some(list) = std::env::var_os(REPOS_DIR_ENV) {
        return std::env::split_paths(&list).collect();
    }
    let mut dirs = vec![PathBuf::from(SYSTEM_REPOS_DIR)];
    if let Some(user) = dirs::config_dir() {
        dirs.push(user.join("pkgverify").join("repos"));
    }
    dirs
}

/// List `*.json` files in `dir`, sorted. A missing directory yields nothing.
fn repo_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(VerifyError::FileOpen {
                path: dir.display().to_string(),
                source: e,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(VerifyError::Io)?.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_repo_file(path: &Path) -> Result<BTreeMap<String, RepoSettings>> {
    let content = std::fs::read_to_string(path).map_err(|e| VerifyError::FileOpen {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| VerifyError::ConfigParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
