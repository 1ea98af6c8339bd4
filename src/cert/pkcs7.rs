//! Minimal PKCS#7 SignedData envelope walking.
//!
//! Android v1 signature blocks (`META-INF/*.RSA`, `*.DSA`, `*.EC`) are DER
//! PKCS#7 SignedData structures. The ecosystem has no maintained pure-Rust
//! PKCS#7 reader, so this module walks the envelope itself and hands the
//! embedded X.509 certificates and signer signature values to the caller as
//! raw DER slices. All certificate parsing is delegated to `x509-parser`.

use thiserror::Error;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_CONTEXT_0: u8 = 0xa0;
const TAG_CONTEXT_1: u8 = 0xa1;

/// Encoded OID 1.2.840.113549.1.7.2 (pkcs7-signedData).
const SIGNED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Pkcs7Error {
    #[error("truncated DER structure")]
    Truncated,
    #[error("malformed DER length")]
    MalformedLength,
    #[error("expected tag {expected:#04x}, found {found:#04x}")]
    UnexpectedTag { expected: u8, found: u8 },
    #[error("not a PKCS#7 SignedData structure")]
    NotSignedData,
}

struct Tlv<'a> {
    tag: u8,
    content: &'a [u8],
    /// Full encoding including tag and length header.
    raw: &'a [u8],
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read(&mut self) -> Result<Tlv<'a>, Pkcs7Error> {
        let tag = *self.data.get(self.pos).ok_or(Pkcs7Error::Truncated)?;
        let mut idx = self.pos + 1;
        let first = *self.data.get(idx).ok_or(Pkcs7Error::Truncated)?;
        idx += 1;
        let length = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7f);
            if count == 0 || count > 4 {
                return Err(Pkcs7Error::MalformedLength);
            }
            let mut length = 0usize;
            for _ in 0..count {
                let byte = *self.data.get(idx).ok_or(Pkcs7Error::Truncated)?;
                idx += 1;
                length = (length << 8) | usize::from(byte);
            }
            length
        };
        let end = idx.checked_add(length).ok_or(Pkcs7Error::MalformedLength)?;
        if end > self.data.len() {
            return Err(Pkcs7Error::Truncated);
        }
        let tlv = Tlv {
            tag,
            content: &self.data[idx..end],
            raw: &self.data[self.pos..end],
        };
        self.pos = end;
        Ok(tlv)
    }

    fn expect(&mut self, tag: u8) -> Result<Tlv<'a>, Pkcs7Error> {
        let tlv = self.read()?;
        if tlv.tag != tag {
            return Err(Pkcs7Error::UnexpectedTag {
                expected: tag,
                found: tlv.tag,
            });
        }
        Ok(tlv)
    }
}

/// The DER encodings of every certificate embedded in a SignedData block.
pub fn certificates(der: &[u8]) -> Result<Vec<&[u8]>, Pkcs7Error> {
    parse_signed_data(der).map(|(certs, _)| certs)
}

/// The raw signature value of every SignerInfo in a SignedData block.
pub fn signatures(der: &[u8]) -> Result<Vec<&[u8]>, Pkcs7Error> {
    parse_signed_data(der).map(|(_, sigs)| sigs)
}

/// Splits a DSA/ECDSA signature value into its `(r, s)` integer contents.
/// Returns `None` when the value is not a two-integer DER sequence, which is
/// the case for RSA signatures.
pub fn signature_components(signature: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut outer = Reader::new(signature);
    let sequence = outer.expect(TAG_SEQUENCE).ok()?;
    if !outer.done() {
        return None;
    }
    let mut inner = Reader::new(sequence.content);
    let r = inner.expect(TAG_INTEGER).ok()?;
    let s = inner.expect(TAG_INTEGER).ok()?;
    if !inner.done() {
        return None;
    }
    Some((r.content, s.content))
}

fn parse_signed_data(der: &[u8]) -> Result<(Vec<&[u8]>, Vec<&[u8]>), Pkcs7Error> {
    let mut outer = Reader::new(der);
    let content_info = outer.expect(TAG_SEQUENCE)?;

    let mut info = Reader::new(content_info.content);
    let oid = info.expect(TAG_OID)?;
    if oid.content != SIGNED_DATA_OID {
        return Err(Pkcs7Error::NotSignedData);
    }
    let explicit = info.expect(TAG_CONTEXT_0)?;

    let mut wrapper = Reader::new(explicit.content);
    let signed_data = wrapper.expect(TAG_SEQUENCE)?;

    let mut body = Reader::new(signed_data.content);
    body.expect(TAG_INTEGER)?; // version
    body.expect(TAG_SET)?; // digestAlgorithms
    body.expect(TAG_SEQUENCE)?; // encapContentInfo

    let mut certs = Vec::new();
    if body.peek_tag() == Some(TAG_CONTEXT_0) {
        let cert_set = body.read()?;
        let mut items = Reader::new(cert_set.content);
        while !items.done() {
            let item = items.read()?;
            if item.tag == TAG_SEQUENCE {
                certs.push(item.raw);
            }
        }
    }
    if body.peek_tag() == Some(TAG_CONTEXT_1) {
        body.read()?; // crls
    }

    let signer_infos = body.expect(TAG_SET)?;
    let mut signatures = Vec::new();
    let mut infos = Reader::new(signer_infos.content);
    while !infos.done() {
        let entry = infos.read()?;
        if entry.tag != TAG_SEQUENCE {
            continue;
        }
        let mut signer = Reader::new(entry.content);
        signer.expect(TAG_INTEGER)?; // version
        signer.read()?; // signer identifier, either form
        signer.expect(TAG_SEQUENCE)?; // digestAlgorithm
        if signer.peek_tag() == Some(TAG_CONTEXT_0) {
            signer.read()?; // signedAttrs
        }
        signer.expect(TAG_SEQUENCE)?; // signatureAlgorithm
        let signature = signer.expect(TAG_OCTET_STRING)?;
        signatures.push(signature.content);
    }

    Ok((certs, signatures))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = content.len();
        if len < 0x80 {
            out.push(len as u8);
        } else if len <= 0xff {
            out.push(0x81);
            out.push(len as u8);
        } else {
            out.push(0x82);
            out.push((len >> 8) as u8);
            out.push(len as u8);
        }
        out.extend_from_slice(content);
        out
    }

    fn signer_info(signature: &[u8]) -> Vec<u8> {
        let mut content = Vec::new();
        content.extend(tlv(TAG_INTEGER, &[1])); // version
        content.extend(tlv(TAG_SEQUENCE, &[])); // issuerAndSerialNumber
        content.extend(tlv(TAG_SEQUENCE, &[])); // digestAlgorithm
        content.extend(tlv(TAG_SEQUENCE, &[])); // signatureAlgorithm
        content.extend(tlv(TAG_OCTET_STRING, signature));
        tlv(TAG_SEQUENCE, &content)
    }

    fn signed_data(cert_bodies: &[&[u8]], signature_values: &[&[u8]]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(tlv(TAG_INTEGER, &[1])); // version
        body.extend(tlv(TAG_SET, &[])); // digestAlgorithms
        body.extend(tlv(TAG_SEQUENCE, &[])); // encapContentInfo
        if !cert_bodies.is_empty() {
            let mut certs = Vec::new();
            for cert in cert_bodies {
                certs.extend(tlv(TAG_SEQUENCE, cert));
            }
            body.extend(tlv(TAG_CONTEXT_0, &certs));
        }
        let mut infos = Vec::new();
        for signature in signature_values {
            infos.extend(signer_info(signature));
        }
        body.extend(tlv(TAG_SET, &infos));

        let mut info = Vec::new();
        info.extend(tlv(TAG_OID, SIGNED_DATA_OID));
        info.extend(tlv(TAG_CONTEXT_0, &tlv(TAG_SEQUENCE, &body)));
        tlv(TAG_SEQUENCE, &info)
    }

    #[test]
    fn extracts_embedded_certificates() {
        let block = signed_data(&[b"first cert body", b"second cert body"], &[b"sig"]);
        let certs = certificates(&block).unwrap();
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0], tlv(TAG_SEQUENCE, b"first cert body").as_slice());
        assert_eq!(certs[1], tlv(TAG_SEQUENCE, b"second cert body").as_slice());
    }

    #[test]
    fn extracts_signer_signatures() {
        let block = signed_data(&[b"cert"], &[b"sig one", b"sig two"]);
        let sigs = signatures(&block).unwrap();
        assert_eq!(sigs, vec![b"sig one".as_slice(), b"sig two".as_slice()]);
    }

    #[test]
    fn handles_missing_certificate_set() {
        let block = signed_data(&[], &[b"sig"]);
        assert!(certificates(&block).unwrap().is_empty());
        assert_eq!(signatures(&block).unwrap().len(), 1);
    }

    #[test]
    fn rejects_wrong_content_type() {
        let mut info = Vec::new();
        info.extend(tlv(TAG_OID, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01]));
        info.extend(tlv(TAG_CONTEXT_0, &[]));
        let block = tlv(TAG_SEQUENCE, &info);
        assert_eq!(certificates(&block).unwrap_err(), Pkcs7Error::NotSignedData);
    }

    #[test]
    fn rejects_truncated_data() {
        let block = signed_data(&[b"cert"], &[b"sig"]);
        let truncated = &block[..block.len() - 4];
        assert!(certificates(truncated).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(certificates(b"not der at all").is_err());
        assert!(certificates(&[]).is_err());
    }

    #[test]
    fn long_form_lengths_round_trip() {
        let big = vec![0xabu8; 300];
        let block = signed_data(&[&big], &[]);
        let certs = certificates(&block).unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(&certs[0][certs[0].len() - 300..], big.as_slice());
    }

    #[test]
    fn signature_components_split_r_and_s() {
        let mut content = Vec::new();
        content.extend(tlv(TAG_INTEGER, &[0x00, 0x9a, 0x1b]));
        content.extend(tlv(TAG_INTEGER, &[0x42]));
        let sig = tlv(TAG_SEQUENCE, &content);
        let (r, s) = signature_components(&sig).unwrap();
        assert_eq!(r, &[0x00, 0x9a, 0x1b]);
        assert_eq!(s, &[0x42]);
    }

    #[test]
    fn signature_components_reject_non_sequences() {
        assert_eq!(signature_components(b"\x02\x01\x01"), None);
        assert_eq!(signature_components(&[]), None);
        // RSA signatures are a plain opaque blob, not an integer pair.
        assert_eq!(signature_components(&[0xde, 0xad, 0xbe, 0xef]), None);
    }
}
