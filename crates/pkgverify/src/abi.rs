//! Platform ABI string
//!
//! Packages are published per ABI, written `<OS>:<major release>:<arch>`,
//! for example `FreeBSD:14:amd64`.

use crate::error::{Result, VerifyError};

/// Detect the ABI string of the running system.
///
/// # Errors
///
/// Returns `VerifyError::Abi` if the kernel release cannot be read.
pub fn platform_abi() -> Result<String> {
    let release = kernel_release()?;
    let major = major_release(&release)
        .ok_or_else(|| VerifyError::Abi(format!("unrecognised kernel release '{release}'")))?;
    Ok(format_abi(std::env::consts::OS, major, std::env::consts::ARCH))
}

/// Assemble an ABI string from its parts.
#[must_use]
pub fn format_abi(os: &str, major: u32, arch: &str) -> String {
    format!("{}:{major}:{}", os_name(os), arch_name(arch))
}

/// Leading numeric component of a release string (`14.1-RELEASE-p3` -> 14).
#[must_use]
pub fn major_release(release: &str) -> Option<u32> {
    let digits: String = release
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn os_name(os: &str) -> String {
    match os {
        "freebsd" => "FreeBSD".to_string(),
        "dragonfly" => "DragonFly".to_string(),
        "netbsd" => "NetBSD".to_string(),
        "openbsd" => "OpenBSD".to_string(),
        "macos" => "Darwin".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

fn arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "i386",
        "powerpc64" => "powerpc64",
        other => other,
    }
}

#[cfg(unix)]
fn kernel_release() -> Result<String> {
    let uts = nix::sys::utsname::uname()
        .map_err(|e| VerifyError::Abi(format!("uname failed: {e}")))?;
    Ok(uts.release().to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn kernel_release() -> Result<String> {
    Err(VerifyError::Abi(
        "kernel release is only available on Unix systems".to_string(),
    ))
}
