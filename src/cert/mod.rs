//! Signing-certificate extraction and key metadata.
//!
//! The PKCS#7 envelope of a signature block is walked by [`pkcs7`]; each
//! embedded certificate is parsed with `x509-parser` and reduced to the key
//! metadata the weak-key checks need. [`roca`] carries the weak-modulus
//! fingerprint detector.

pub mod pkcs7;
pub mod roca;

use std::fmt;

use sha2::{Digest, Sha256};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::error::Error;

/// Key algorithm family of a certificate's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Dsa,
    Ec,
    Unknown,
}

impl KeyFamily {
    /// Minimum acceptable key size in bits, or `None` when no policy exists
    /// for the family.
    pub fn minimum_bits(self) -> Option<u32> {
        match self {
            KeyFamily::Rsa | KeyFamily::Dsa => Some(2048),
            KeyFamily::Ec => Some(224),
            KeyFamily::Unknown => None,
        }
    }
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Dsa => "DSA",
            KeyFamily::Ec => "EC",
            KeyFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Key metadata extracted from one signing certificate.
#[derive(Debug, Clone)]
pub struct SigningCertificate {
    /// SHA-256 over the certificate DER, hex encoded. Used to deduplicate
    /// the same certificate across signature blocks.
    pub fingerprint: String,
    pub family: KeyFamily,
    pub key_bits: u32,
    /// Big-endian modulus bytes, RSA keys only.
    pub rsa_modulus: Option<Vec<u8>>,
}

impl SigningCertificate {
    /// Parses certificate DER into key metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] when the bytes are not a parseable
    /// X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| Error::Certificate(e.to_string()))?;
        let (family, key_bits, rsa_modulus) = match cert.public_key().parsed() {
            Ok(PublicKey::RSA(rsa)) => {
                let modulus = strip_leading_zeros(rsa.modulus).to_vec();
                let bits = int_bits(&modulus);
                (KeyFamily::Rsa, bits, Some(modulus))
            }
            Ok(PublicKey::DSA(y)) => (
                KeyFamily::Dsa,
                (strip_leading_zeros(y).len() * 8) as u32,
                None,
            ),
            Ok(PublicKey::EC(point)) => (KeyFamily::Ec, ec_key_bits(point.data()), None),
            _ => (KeyFamily::Unknown, 0, None),
        };
        Ok(Self {
            fingerprint: hex::encode(Sha256::digest(der)),
            family,
            key_bits,
            rsa_modulus,
        })
    }
}

/// Drops the sign-padding zero bytes of a DER integer.
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Exact bit length of a big-endian integer with no leading zero bytes.
fn int_bits(bytes: &[u8]) -> u32 {
    match bytes.first() {
        Some(&b) => (bytes.len() as u32 - 1) * 8 + (8 - b.leading_zeros()),
        None => 0,
    }
}

/// Field size of an elliptic-curve public key from its encoded point.
fn ec_key_bits(point: &[u8]) -> u32 {
    match point.first().copied() {
        // Uncompressed or hybrid point: one marker byte plus two coordinates.
        Some(0x04 | 0x06 | 0x07) if point.len() > 1 => ((point.len() as u32 - 1) / 2) * 8,
        // Compressed point: one marker byte plus one coordinate.
        Some(0x02 | 0x03) if point.len() > 1 => (point.len() as u32 - 1) * 8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_der_rejects_garbage() {
        let err = SigningCertificate::from_der(b"not a certificate").unwrap_err();
        assert!(matches!(err, Error::Certificate(_)));
    }

    #[test]
    fn strip_leading_zeros_handles_padding() {
        assert_eq!(strip_leading_zeros(&[0x00, 0x80, 0x01]), &[0x80, 0x01]);
        assert_eq!(strip_leading_zeros(&[0x7f]), &[0x7f]);
        assert_eq!(strip_leading_zeros(&[0x00, 0x00]), &[] as &[u8]);
    }

    #[test]
    fn int_bits_is_exact() {
        assert_eq!(int_bits(&[]), 0);
        assert_eq!(int_bits(&[0x01]), 1);
        assert_eq!(int_bits(&[0x80]), 8);
        // A 1024-bit modulus: top bit of a 128-byte integer set.
        let mut modulus = vec![0u8; 128];
        modulus[0] = 0x80;
        assert_eq!(int_bits(&modulus), 1024);
        modulus[0] = 0x40;
        assert_eq!(int_bits(&modulus), 1023);
    }

    #[test]
    fn ec_key_bits_from_point_encoding() {
        // P-256 uncompressed: 1 + 32 + 32 bytes.
        let mut p256 = vec![0u8; 65];
        p256[0] = 0x04;
        assert_eq!(ec_key_bits(&p256), 256);
        // P-224 uncompressed: 1 + 28 + 28 bytes.
        let mut p224 = vec![0u8; 57];
        p224[0] = 0x04;
        assert_eq!(ec_key_bits(&p224), 224);
        // P-192 compressed: 1 + 24 bytes.
        let mut p192 = vec![0u8; 25];
        p192[0] = 0x02;
        assert_eq!(ec_key_bits(&p192), 192);
        assert_eq!(ec_key_bits(&[]), 0);
    }

    #[test]
    fn minimum_bits_policy() {
        assert_eq!(KeyFamily::Rsa.minimum_bits(), Some(2048));
        assert_eq!(KeyFamily::Dsa.minimum_bits(), Some(2048));
        assert_eq!(KeyFamily::Ec.minimum_bits(), Some(224));
        assert_eq!(KeyFamily::Unknown.minimum_bits(), None);
    }
}
