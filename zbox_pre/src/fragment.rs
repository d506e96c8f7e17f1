//! Storage layout of a first-level ciphertext.
//!
//! A stored fragment is the two hex checksums followed by the AEAD output. The
//! encrypted key travels out of band, next to the file metadata.
//!
//! ```text
//! offset 0    message_checksum (128 hex) ‖ overall_checksum (128 hex)
//! offset 256  encrypted_data
//! ```

use crate::error::{Error, Result};
use crate::hash::CHECKSUM_SIZE;
use crate::message::{decode_checksum, trim_nul, EncryptedMessage, HEADER_SIZE};
use crate::symmetric::TAG_SIZE;

/// Checksum header in front of every stored fragment.
pub const ENCRYPTION_HEADER_SIZE: usize = 2 * 2 * CHECKSUM_SIZE;
/// AEAD expansion of every sealed fragment.
pub const ENCRYPTED_DATA_PADDING_SIZE: usize = TAG_SIZE;
/// Header in front of every re-encrypted fragment.
pub const RE_ENCRYPTION_HEADER_SIZE: usize = HEADER_SIZE;

/// Largest plaintext whose stored fragment fits in `fragment_size` bytes.
pub fn max_plaintext_len(fragment_size: usize) -> usize {
    fragment_size.saturating_sub(ENCRYPTION_HEADER_SIZE + ENCRYPTED_DATA_PADDING_SIZE)
}

/// Size of the re-encrypted message built from a stored fragment of `fragment_len`
/// bytes. The re-encryption header takes the place of the checksum header.
pub fn re_encrypted_len(fragment_len: usize) -> usize {
    fragment_len.saturating_sub(ENCRYPTION_HEADER_SIZE) + RE_ENCRYPTION_HEADER_SIZE
}

impl EncryptedMessage {
    /// Serializes the message for storage, without its encrypted key.
    pub fn to_fragment(&self) -> Result<Vec<u8>> {
        decode_checksum(&self.message_checksum, "message checksum")?;
        decode_checksum(&self.overall_checksum, "overall checksum")?;

        let mut out = Vec::with_capacity(ENCRYPTION_HEADER_SIZE + self.encrypted_data.len());
        out.extend_from_slice(self.message_checksum.as_bytes());
        out.extend_from_slice(self.overall_checksum.as_bytes());
        out.extend_from_slice(&self.encrypted_data);
        Ok(out)
    }

    /// Rebuilds a message from a stored fragment and its out-of-band encrypted key.
    pub fn from_fragment(fragment: &[u8], encrypted_key: &str) -> Result<Self> {
        if fragment.len() < ENCRYPTION_HEADER_SIZE {
            return Err(Error::parse(format!(
                "fragment must be at least {ENCRYPTION_HEADER_SIZE} bytes, got {}",
                fragment.len()
            )));
        }
        let (header, encrypted_data) = fragment.split_at(ENCRYPTION_HEADER_SIZE);
        let header = std::str::from_utf8(trim_nul(header))
            .map_err(|_| Error::parse("fragment header is not ASCII"))?;
        if header.len() != ENCRYPTION_HEADER_SIZE {
            return Err(Error::parse("fragment header is truncated"));
        }
        let (message_checksum, overall_checksum) = header.split_at(2 * CHECKSUM_SIZE);
        decode_checksum(message_checksum, "message checksum")?;
        decode_checksum(overall_checksum, "overall checksum")?;

        Ok(Self {
            encrypted_key: encrypted_key.to_string(),
            encrypted_data: encrypted_data.to_vec(),
            message_checksum: message_checksum.to_ascii_lowercase(),
            overall_checksum: overall_checksum.to_ascii_lowercase(),
            re_encryption_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(data: &[u8]) -> EncryptedMessage {
        EncryptedMessage {
            encrypted_key: "key".to_string(),
            encrypted_data: data.to_vec(),
            message_checksum: hex::encode([0xabu8; CHECKSUM_SIZE]),
            overall_checksum: hex::encode([0x01u8; CHECKSUM_SIZE]),
            re_encryption_key: None,
        }
    }

    #[test]
    fn test_fragment_round_trip() {
        let msg = message(b"ciphertext and tag");
        let fragment = msg.to_fragment().unwrap();
        assert_eq!(fragment.len(), ENCRYPTION_HEADER_SIZE + msg.encrypted_data.len());
        assert_eq!(EncryptedMessage::from_fragment(&fragment, "key").unwrap(), msg);
    }

    #[test]
    fn test_header_only_fragment() {
        let msg = message(b"");
        let fragment = msg.to_fragment().unwrap();
        assert_eq!(fragment.len(), ENCRYPTION_HEADER_SIZE);
        assert!(EncryptedMessage::from_fragment(&fragment, "key")
            .unwrap()
            .encrypted_data
            .is_empty());
    }

    #[test]
    fn test_short_fragment_rejected() {
        assert!(matches!(
            EncryptedMessage::from_fragment(&[b'a'; 255], "key"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_padded_header_rejected() {
        let mut fragment = vec![b'a'; 200];
        fragment.resize(ENCRYPTION_HEADER_SIZE + 4, 0);
        assert!(EncryptedMessage::from_fragment(&fragment, "key").is_err());
    }

    #[test]
    fn test_non_hex_header_rejected() {
        let mut fragment = message(b"x").to_fragment().unwrap();
        fragment[0] = b'g';
        assert!(EncryptedMessage::from_fragment(&fragment, "key").is_err());
    }

    #[test]
    fn test_to_fragment_requires_full_checksums() {
        let msg = EncryptedMessage {
            message_checksum: "ab".to_string(),
            ..message(b"x")
        };
        assert!(msg.to_fragment().is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(ENCRYPTION_HEADER_SIZE, 256);
        assert_eq!(max_plaintext_len(64 * 1024), 64 * 1024 - 256 - 16);
        assert_eq!(max_plaintext_len(100), 0);
        assert_eq!(re_encrypted_len(1000), 1000);
        assert_eq!(re_encrypted_len(0), RE_ENCRYPTION_HEADER_SIZE);
    }
}
