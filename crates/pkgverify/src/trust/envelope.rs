//! Certificate envelope parsing
//!
//! A `.sig` sidecar carries the package signature and the signer's public key
//! certificate in one line-oriented file:
//!
//! ```text
//! SIGNATURE
//! <raw signature bytes>
//! CERT
//! -----BEGIN PUBLIC KEY-----
//! ...
//! -----END PUBLIC KEY-----
//! END
//! ```
//!
//! Marker lines switch the capture target; everything before the first
//! marker is ignored. Lines are split on `\n` and kept byte-exact, since the
//! signature section is binary.

use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use super::types::SignedCertificate;

const SIGNATURE_MARKER: &[u8] = b"SIGNATURE\n";
const CERT_MARKER: &[u8] = b"CERT\n";
const END_MARKER: &[u8] = b"END\n";

#[derive(Clone, Copy)]
enum Section {
    Preamble,
    Signature,
    Certificate,
}

/// Parse an envelope from a reader.
///
/// Stops at the `END` marker. Reaching end of input without one is accepted
/// and returns whatever was captured. The signature loses the single `\n`
/// that separates it from the next marker; the certificate is returned
/// untouched.
///
/// # Errors
///
/// Returns `VerifyError::Io` if the reader fails.
pub fn parse_envelope<R: Read>(reader: R) -> Result<SignedCertificate> {
    let mut reader = BufReader::new(reader);
    let mut signature = Vec::new();
    let mut certificate = Vec::new();
    let mut section = Section::Preamble;
    let mut line = Vec::new();
    let mut terminated = false;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        match line.as_slice() {
            SIGNATURE_MARKER => section = Section::Signature,
            CERT_MARKER => section = Section::Certificate,
            END_MARKER => {
                terminated = true;
                break;
            }
            bytes => match section {
                Section::Preamble => {}
                Section::Signature => signature.extend_from_slice(bytes),
                Section::Certificate => certificate.extend_from_slice(bytes),
            },
        }
    }

    if !terminated {
        tracing::warn!("signature envelope has no END marker, using partial contents");
    }

    if signature.last() == Some(&b'\n') {
        signature.pop();
    }

    Ok(SignedCertificate::new(signature, certificate))
}

/// Parse an envelope from an open sidecar file.
///
/// Reads from offset 0 through a duplicate handle and leaves the shared
/// offset at 0 afterwards.
///
/// # Errors
///
/// Returns `VerifyError::Io` if the file cannot be duplicated, seeked or read.
pub fn parse_envelope_file(file: &File) -> Result<SignedCertificate> {
    let mut cursor = file.try_clone()?;
    cursor.seek(SeekFrom::Start(0))?;
    let parsed = parse_envelope(&mut cursor);
    cursor.seek(SeekFrom::Start(0))?;
    parsed
}

impl SignedCertificate {
    /// Serialize to the envelope format accepted by [`parse_envelope`].
    ///
    /// The certificate is written as-is and must end with a newline (PEM
    /// always does) for the `END` marker to be recognised.
    #[must_use]
    pub fn to_envelope(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            SIGNATURE_MARKER.len()
                + self.signature().len()
                + 1
                + CERT_MARKER.len()
                + self.certificate().len()
                + END_MARKER.len(),
        );
        out.extend_from_slice(SIGNATURE_MARKER);
        out.extend_from_slice(self.signature());
        out.push(b'\n');
        out.extend_from_slice(CERT_MARKER);
        out.extend_from_slice(self.certificate());
        out.extend_from_slice(END_MARKER);
        out
    }
}
