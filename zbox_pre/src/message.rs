//! Ciphertexts and re-encryption keys as they travel between owner, proxy and
//! recipient.
//!
//! First-level ciphertexts and re-encryption keys are JSON. The proxy output uses a
//! fixed binary layout: a 256-byte NUL-padded ASCII header
//! `b64(D1),b64(D3),b64(D4),b64(D5)` followed by the raw `D2` bytes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::group::{decode_base64, Point, Scalar};
use crate::hash::CHECKSUM_SIZE;

/// Size of the [`ReEncryptedMessage`] header.
pub const HEADER_SIZE: usize = 256;

/// First-level ciphertext, decryptable by the owner or transformable by a proxy.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// base64 of `C1`
    pub encrypted_key: String,
    /// AES-GCM output `C2`, ciphertext ‖ tag
    #[serde_as(as = "Base64")]
    pub encrypted_data: Vec<u8>,
    /// hex of `C3`
    pub message_checksum: String,
    /// hex of `C4`
    pub overall_checksum: String,
    /// JSON re-encryption key attached by a proxy that defers the transformation
    /// to the reader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re_encryption_key: Option<String>,
}

impl EncryptedMessage {
    pub(crate) fn encrypted_key_point(&self) -> Result<Point> {
        Point::from_base64(&self.encrypted_key)
    }

    /// Decodes `(C3, C4)`.
    pub(crate) fn checksums(&self) -> Result<([u8; CHECKSUM_SIZE], [u8; CHECKSUM_SIZE])> {
        Ok((
            decode_checksum(&self.message_checksum, "message checksum")?,
            decode_checksum(&self.overall_checksum, "overall checksum")?,
        ))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::parse(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::parse(e.to_string()))
    }
}

pub(crate) fn decode_checksum(encoded: &str, what: &str) -> Result<[u8; CHECKSUM_SIZE]> {
    let mut out = [0u8; CHECKSUM_SIZE];
    hex::decode_to_slice(encoded, &mut out)
        .map_err(|e| Error::parse(format!("invalid {what}: {e}")))?;
    Ok(out)
}

/// Re-encryption key from an owner to one recipient under one tag.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ReKey {
    /// `r·G − H1(tag, sk_owner)`
    pub(crate) r1: Point,
    /// `r·pk_recipient`
    pub(crate) r2: Point,
    /// `H6(tag, sk_owner)`
    pub(crate) r3: Scalar,
}

#[derive(Serialize, Deserialize)]
struct ReKeyJson {
    r1: String,
    r2: String,
    r3: String,
}

impl ReKey {
    pub fn to_json(&self) -> Result<String> {
        let encoded = ReKeyJson {
            r1: self.r1.to_base64(),
            r2: self.r2.to_base64(),
            r3: self.r3.to_base64(),
        };
        serde_json::to_string(&encoded).map_err(|e| Error::parse(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut decoded: ReKeyJson = serde_json::from_str(json)
            .map_err(|e| Error::parse(format!("invalid re-encryption key: {e}")))?;
        let rekey = Self {
            r1: Point::from_base64(&decoded.r1)?,
            r2: Point::from_base64(&decoded.r2)?,
            r3: Scalar::from_base64(&decoded.r3)?,
        };
        decoded.r3.zeroize();
        Ok(rekey)
    }
}

impl std::fmt::Debug for ReKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReKey")
            .field("r1", &self.r1)
            .field("r2", &self.r2)
            .finish_non_exhaustive()
    }
}

/// Second-level ciphertext produced by the proxy for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReEncryptedMessage {
    /// `β·(C1 + R1)`
    pub d1: Point,
    /// `C2`, untouched
    pub d2: Vec<u8>,
    /// `C3`, untouched
    pub d3: [u8; CHECKSUM_SIZE],
    /// `R2`
    pub d4: Point,
    /// `t'·G`
    pub d5: Point,
}

impl ReEncryptedMessage {
    pub fn marshal(&self) -> Vec<u8> {
        let header = [
            self.d1.to_base64(),
            BASE64.encode(self.d3),
            self.d4.to_base64(),
            self.d5.to_base64(),
        ]
        .join(",");

        let mut out = Vec::with_capacity(HEADER_SIZE + self.d2.len());
        out.extend_from_slice(header.as_bytes());
        out.resize(HEADER_SIZE, 0);
        out.extend_from_slice(&self.d2);
        out
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::parse(format!(
                "re-encrypted message must be at least {HEADER_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let (header, d2) = data.split_at(HEADER_SIZE);
        let header = std::str::from_utf8(trim_nul(header))
            .map_err(|_| Error::parse("re-encrypted header is not ASCII"))?;

        let (d1, d3, d4, d5) = header
            .split(',')
            .collect_tuple()
            .ok_or_else(|| Error::parse("re-encrypted header must have 4 fields"))?;

        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&decode_base64(d3, CHECKSUM_SIZE, "D3")?);

        Ok(Self {
            d1: Point::from_base64(d1)?,
            d2: d2.to_vec(),
            d3: checksum,
            d4: Point::from_base64(d4)?,
            d5: Point::from_base64(d5)?,
        })
    }
}

/// Strips the NUL padding of a fixed-size header.
pub(crate) fn trim_nul(header: &[u8]) -> &[u8] {
    let end = header.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &header[..end]
}
