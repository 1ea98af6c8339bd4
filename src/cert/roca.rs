//! Weak-modulus fingerprint detection (ROCA, CVE-2017-15361).
//!
//! Keys generated by the affected Infineon library have moduli of the form
//! `65537^a mod M` for a primorial `M`, so the modulus reduced by each small
//! prime always lands inside the subgroup generated by 65537. The detector
//! derives those subgroup membership tables at construction and tests a
//! modulus against every prime in the published set.
//!
//! Call contract relied on by the rest of the crate:
//! [`RocaDetector::has_fingerprint`] takes the big-endian modulus bytes and
//! answers whether the modulus matches the weak-key fingerprint. See
//! <https://roca.crocs.fi.muni.cz/> for the underlying research.

/// The prime set used by the reference fingerprinter.
const PRIMES: [u64; 38] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167,
];

const GENERATOR: u64 = 65537;

pub struct RocaDetector {
    /// Per prime: a membership table over residues of the subgroup generated
    /// by 65537.
    tables: Vec<(u64, Vec<bool>)>,
}

impl RocaDetector {
    pub fn new() -> Self {
        let tables = PRIMES
            .iter()
            .map(|&p| {
                let mut members = vec![false; p as usize];
                let g = GENERATOR % p;
                let mut x = 1u64;
                loop {
                    members[x as usize] = true;
                    x = x * g % p;
                    if x == 1 {
                        break;
                    }
                }
                (p, members)
            })
            .collect();
        Self { tables }
    }

    /// Tests the big-endian modulus bytes against the fingerprint.
    pub fn has_fingerprint(&self, modulus: &[u8]) -> bool {
        if modulus.is_empty() {
            return false;
        }
        self.tables
            .iter()
            .all(|(p, members)| members[reduce(modulus, *p) as usize])
    }
}

impl Default for RocaDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Big-endian bytes modulo a small prime.
fn reduce(bytes: &[u8], p: u64) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| (acc * 256 + u64::from(b)) % p)
}
