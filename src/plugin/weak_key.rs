//! Detection of weak Android signing keys.
//!
//! Certificates are pulled out of the v1 signature blocks under `META-INF/`
//! and deduplicated by content fingerprint, so a package signed with the
//! same certificate across several blocks is only checked once. Three
//! independent checks run against the collected material: minimum key size
//! by algorithm family, the ROCA weak-modulus fingerprint, and reuse of the
//! nonce-derived `r` component across DSA/ECDSA signatures.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::cert::roca::RocaDetector;
use crate::cert::{pkcs7, strip_leading_zeros, SigningCertificate};
use crate::model::PluginReport;
use crate::plugin::{Plugin, ScanContext};

/// The v1 signing scheme stores one signature block per signer, named after
/// the key algorithm.
static SIGNATURE_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"META-INF/.*\.(RSA|DSA|EC)").unwrap());

pub struct WeakKeyPlugin {
    detector: RocaDetector,
}

impl WeakKeyPlugin {
    pub fn new() -> Self {
        Self {
            detector: RocaDetector::new(),
        }
    }

    /// One finding per key below the minimum size of its algorithm family.
    fn check_key_strength(certs: &[SigningCertificate]) -> Vec<String> {
        certs
            .iter()
            .filter_map(|cert| {
                let minimum = cert.family.minimum_bits()?;
                (cert.key_bits < minimum).then(|| {
                    format!(
                        "{} signing key {} is {} bits, below the {} bit minimum",
                        cert.family, cert.fingerprint, cert.key_bits, minimum
                    )
                })
            })
            .collect()
    }

    /// One finding per RSA modulus matching the weak-key fingerprint.
    fn check_roca(&self, certs: &[SigningCertificate]) -> Vec<String> {
        certs
            .iter()
            .filter_map(|cert| {
                let modulus = cert.rsa_modulus.as_deref()?;
                self.detector.has_fingerprint(modulus).then(|| {
                    format!(
                        "RSA modulus of {} matches the ROCA weak-key fingerprint - \
                         see https://roca.crocs.fi.muni.cz/",
                        cert.fingerprint
                    )
                })
            })
            .collect()
    }

    /// One finding per `r` value recurring across two or more signatures.
    /// A recurring value means the signing nonce was reused, which makes the
    /// private key recoverable. Skipped below two qualifying signatures.
    fn check_signature_reuse(nonces: &[Vec<u8>]) -> Vec<String> {
        if nonces.len() < 2 {
            return Vec::new();
        }
        let mut counts: Vec<(&[u8], usize)> = Vec::new();
        for nonce in nonces {
            match counts.iter().position(|(seen, _)| *seen == nonce.as_slice()) {
                Some(i) => counts[i].1 += 1,
                None => counts.push((nonce.as_slice(), 1)),
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .map(|(nonce, count)| {
                format!(
                    "DSA/ECDSA signature value r = {} recurs across {} signatures - \
                     the signing key may be recoverable",
                    hex::encode(nonce),
                    count
                )
            })
            .collect()
    }
}

impl Default for WeakKeyPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for WeakKeyPlugin {
    fn name(&self) -> &'static str {
        "WeakKey"
    }

    fn description(&self) -> &'static str {
        "Detection of weak Android signing keys"
    }

    fn supports_android(&self) -> bool {
        true
    }

    fn supports_ios(&self) -> bool {
        false
    }

    async fn scan(&self, ctx: &ScanContext<'_>) -> Result<PluginReport> {
        let mut report = PluginReport::new();
        let archive = &ctx.package.archive;

        let paths = archive.find_matching(&SIGNATURE_FILE_PATTERN, false);
        if paths.is_empty() {
            report.notice("Cannot find any signature files in the META-INF folder, skipping");
            return Ok(report);
        }
        report.notice(format!("Found {} signature file(s)", paths.len()));

        let mut certs: Vec<SigningCertificate> = Vec::new();
        let mut seen = HashSet::new();
        let mut nonces: Vec<Vec<u8>> = Vec::new();

        for path in &paths {
            let data = match archive.read_entry(path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::debug!(path, error = %e, "signature file not readable");
                    report.notice(format!(
                        "Unable to read signature file - will skip. File: {path}"
                    ));
                    continue;
                }
            };
            let ders = match pkcs7::certificates(&data) {
                Ok(ders) => ders,
                Err(e) => {
                    tracing::debug!(path, error = %e, "signature block not parseable");
                    report.notice(format!(
                        "Unable to parse signature file - will skip. File: {path}"
                    ));
                    continue;
                }
            };
            for der in ders {
                match SigningCertificate::from_der(der) {
                    Ok(cert) => {
                        if seen.insert(cert.fingerprint.clone()) {
                            certs.push(cert);
                        }
                    }
                    Err(e) => {
                        report.notice(format!("Unable to parse certificate in {path}: {e}"));
                    }
                }
            }
            // Only DSA and ECDSA signatures carry a nonce-derived component.
            if path.ends_with(".DSA") || path.ends_with(".EC") {
                if let Ok(signatures) = pkcs7::signatures(&data) {
                    for signature in signatures {
                        if let Some((r, _s)) = pkcs7::signature_components(signature) {
                            nonces.push(strip_leading_zeros(r).to_vec());
                        }
                    }
                }
            }
        }

        if certs.is_empty() {
            report.notice("Cannot find any certificates in the signature files, skipping");
            return Ok(report);
        }
        report.notice(format!("Found {} distinct certificate(s)", certs.len()));

        let mut findings = Self::check_key_strength(&certs);
        findings.extend(self.check_roca(&certs));
        findings.extend(Self::check_signature_reuse(&nonces));

        if findings.is_empty() {
            report.notice("No issues found");
        }
        for finding in findings {
            report.finding(finding);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::KeyFamily;
    use crate::testutil::{archive_with, package_with_flags};

    fn cert(family: KeyFamily, bits: u32) -> SigningCertificate {
        SigningCertificate {
            fingerprint: format!("fp-{family}-{bits}"),
            family,
            key_bits: bits,
            rsa_modulus: None,
        }
    }

    #[test]
    fn signature_file_pattern_matches_meta_inf_blocks() {
        let archive = archive_with(&[
            ("META-INF/CERT.RSA", b"x"),
            ("META-INF/CERT.SF", b"x"),
            ("META-INF/SECOND.DSA", b"x"),
            ("META-INF/THIRD.EC", b"x"),
            ("lib/arm/CERT.RSA", b"x"),
        ]);
        assert_eq!(
            archive.find_matching(&SIGNATURE_FILE_PATTERN, false),
            vec!["META-INF/CERT.RSA", "META-INF/SECOND.DSA", "META-INF/THIRD.EC"]
        );
    }

    #[test]
    fn undersized_rsa_key_is_flagged_with_its_size() {
        let findings = WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Rsa, 1024)]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("RSA"));
        assert!(findings[0].contains("1024"));
        assert!(findings[0].contains("2048"));
        assert!(findings[0].contains("fp-RSA-1024"));
    }

    #[test]
    fn key_strength_check_is_idempotent() {
        let certs = [cert(KeyFamily::Rsa, 1024)];
        assert_eq!(
            WeakKeyPlugin::check_key_strength(&certs),
            WeakKeyPlugin::check_key_strength(&certs)
        );
    }

    #[test]
    fn key_strength_minimums_per_family() {
        assert!(WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Rsa, 2048)]).is_empty());
        assert!(WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Ec, 224)]).is_empty());
        assert_eq!(
            WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Ec, 192)]).len(),
            1
        );
        assert_eq!(
            WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Dsa, 1024)]).len(),
            1
        );
        // No size policy for unrecognized algorithms.
        assert!(WeakKeyPlugin::check_key_strength(&[cert(KeyFamily::Unknown, 0)]).is_empty());
    }

    #[test]
    fn roca_check_flags_fingerprinted_modulus() {
        let plugin = WeakKeyPlugin::new();
        let mut weak = cert(KeyFamily::Rsa, 2048);
        weak.rsa_modulus = Some(vec![0x01, 0x00, 0x02, 0x00, 0x01]); // 65537^2
        let mut clean = cert(KeyFamily::Rsa, 2048);
        clean.fingerprint = "fp-clean".into();
        clean.rsa_modulus = Some(vec![0x01, 0x00, 0x02, 0x00, 0x02]);

        let findings = plugin.check_roca(&[weak, clean]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("ROCA"));
        assert!(findings[0].contains("fp-RSA-2048"));
    }

    #[test]
    fn signature_reuse_needs_at_least_two_signatures() {
        assert!(WeakKeyPlugin::check_signature_reuse(&[]).is_empty());
        assert!(WeakKeyPlugin::check_signature_reuse(&[vec![1, 2, 3]]).is_empty());
    }

    #[test]
    fn signature_reuse_flags_recurring_r_values() {
        let nonces = vec![vec![0xaa, 0xbb], vec![0x01], vec![0xaa, 0xbb], vec![0xaa, 0xbb]];
        let findings = WeakKeyPlugin::check_signature_reuse(&nonces);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("aabb"));
        assert!(findings[0].contains("3 signatures"));
    }

    #[test]
    fn distinct_r_values_are_clean() {
        let nonces = vec![vec![0x01], vec![0x02], vec![0x03]];
        assert!(WeakKeyPlugin::check_signature_reuse(&nonces).is_empty());
    }

    #[tokio::test]
    async fn scan_without_signature_files_reports_skip() {
        let package = package_with_flags(&[("classes.dex", b"dex")], true, false);
        let ctx = ScanContext {
            package: &package,
            online: false,
        };
        let report = WeakKeyPlugin::new().scan(&ctx).await.unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(
            report.notices,
            vec!["Cannot find any signature files in the META-INF folder, skipping"]
        );
    }

    #[tokio::test]
    async fn scan_with_unparseable_block_reports_and_continues() {
        let package = package_with_flags(&[("META-INF/CERT.RSA", b"garbage")], true, false);
        let ctx = ScanContext {
            package: &package,
            online: false,
        };
        let report = WeakKeyPlugin::new().scan(&ctx).await.unwrap();
        assert!(report.findings.is_empty());
        assert!(report
            .notices
            .iter()
            .any(|n| n.contains("Unable to parse signature file")));
        assert!(report
            .notices
            .iter()
            .any(|n| n.contains("Cannot find any certificates")));
    }
}
