use thiserror::Error;

/// Result type for every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the re-encryption scheme.
///
/// Messages never carry key material, so every variant is safe to log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A key could not be derived, restored or parsed.
    #[error("key initialization failed: {0}")]
    KeyInit(String),

    /// Malformed base64, hex, JSON or framing, or a non-canonical group element.
    #[error("parse error: {0}")]
    Parse(String),

    /// The proxy-side overall checksum does not match: the ciphertext was altered
    /// or the re-encryption key was issued for another tag.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Decryption was rejected. Covers the overall checksum, the AEAD tag and the
    /// message checksum without telling them apart.
    #[error("decryption failed")]
    AuthFailed,

    /// The session is not in a state that allows the operation.
    #[error("{operation} is not valid in the {state} state")]
    WrongState {
        operation: &'static str,
        state: &'static str,
    },

    /// The operating system randomness source failed.
    #[error("randomness source failed: {0}")]
    RandomnessFailure(String),

    /// The symmetric layer refused to seal the plaintext.
    #[error("symmetric encryption failed")]
    Encrypt,
}

impl Error {
    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::Parse(reason.into())
    }

    pub(crate) fn key_init(reason: impl Into<String>) -> Self {
        Self::KeyInit(reason.into())
    }
}
