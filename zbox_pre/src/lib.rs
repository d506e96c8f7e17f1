//! # zbox_pre
//!
//! zbox_pre is a tag-based proxy re-encryption library over ed25519. An owner encrypts content once under its own key and a tag such as `filetype:audio`. To share it, the owner issues a re-encryption key for a recipient and that tag. A proxy, in practice the storage node holding the ciphertext, uses it to transform the ciphertext for the recipient, without ever learning the plaintext or the owner's key.
//!
//! Payloads are sealed with AES-256-GCM. Keys are derived deterministically from a mnemonic phrase, so the same phrase always yields the same key pair.
//!
//! A re-encryption key only works for ciphertexts under the tag it was issued for: the proxy's overall checksum check fails for any other tag.
//!
//! ## Example
//!
//! ```rust
//! use zbox_pre::{new_encryption_scheme, EncryptionScheme};
//!
//! let mut owner = new_encryption_scheme();
//! owner.initialize("inside february piece turkey offer merry select combine tissue wave wet shift room afraid december gown mean brick speak grant gain become toy clown").unwrap();
//! owner.init_for_encryption("filetype:audio").unwrap();
//! let msg = owner.encrypt(b"hello").unwrap();
//!
//! let mut recipient = new_encryption_scheme();
//! recipient.initialize("travel twenty hen negative fresh sentence hen flat swift embody increase juice eternal satisfy want vessel matter honey video begin dutch trigger romance assault").unwrap();
//! let re_key = owner
//!     .get_re_gen_key(&recipient.get_public_key().unwrap(), "filetype:audio")
//!     .unwrap();
//!
//! // any party can act as the proxy, no key material is needed
//! let proxy = new_encryption_scheme();
//! let shared = proxy
//!     .re_encrypt(&msg, &re_key, &recipient.get_public_key().unwrap())
//!     .unwrap();
//!
//! recipient
//!     .init_for_decryption("filetype:audio", &msg.encrypted_key)
//!     .unwrap();
//! assert_eq!(recipient.re_decrypt(&shared).unwrap(), b"hello");
//! ```
//!
//! For a longer walkthrough, refer to [examples/share.rs](../examples/share.rs).

mod error;
pub mod fragment;
mod group;
mod hash;
mod message;
mod mnemonic;
mod scheme;
mod session;
mod symmetric;

pub use error::{Error, Result};
pub use group::{Point, Scalar, POINT_SIZE, SCALAR_SIZE};
pub use hash::CHECKSUM_SIZE;
pub use message::{EncryptedMessage, ReEncryptedMessage, ReKey, HEADER_SIZE};
pub use scheme::{EncryptionScheme, PreEncryptionScheme};
pub use symmetric::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Creates an empty session. Call [`EncryptionScheme::initialize`] before anything else.
pub fn new_encryption_scheme() -> PreEncryptionScheme {
    PreEncryptionScheme::new()
}
