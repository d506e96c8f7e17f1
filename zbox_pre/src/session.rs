//! Session state: key pair, tag and per-message commitment.
//!
//! ```text
//!     Fresh ──initialize──▶ Keyed ──init_for_encryption──▶ Encrypting
//!                               └──init_for_decryption──▶ Decrypting
//! ```

use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::group::{Point, Scalar};
use crate::hash;

/// Long-term key pair, `pk = sk·G`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct KeyPair {
    pub(crate) sk: Scalar,
    pub(crate) pk: Point,
}

impl KeyPair {
    pub(crate) fn from_secret(sk: Scalar) -> Result<Self> {
        if sk.is_zero() {
            return Err(Error::key_init("secret key must be non-zero"));
        }
        Ok(Self {
            pk: Point::mul_base(&sk),
            sk,
        })
    }
}

/// Ephemeral values for one first-level ciphertext.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct EncryptionCommitment {
    pub(crate) tag: Vec<u8>,
    t: Scalar,
    /// `T = t·G`, hashed into the AEAD key and the message checksum.
    pub(crate) t_point: Point,
    /// `Ht = H1(tag, sk)`
    ht: Point,
    /// `C1 = Ht + T`, published as the encrypted key.
    pub(crate) c1: Point,
    spent: bool,
}

impl EncryptionCommitment {
    fn new<R: RngCore + CryptoRng>(keys: &KeyPair, tag: &[u8], rng: &mut R) -> Result<Self> {
        let ht = hash::h1(tag, &keys.sk);
        let t = Scalar::random(rng)?;
        let t_point = Point::mul_base(&t);
        Ok(Self {
            tag: tag.to_vec(),
            t,
            t_point,
            ht,
            c1: ht + t_point,
            spent: false,
        })
    }

    /// Hands out the commitment for exactly one plaintext. A commitment that was
    /// already used is replaced by a fresh `t, T, C1` first, so the AEAD nonce
    /// derived from `T` never repeats.
    pub(crate) fn take<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<&Self> {
        if self.spent {
            self.t = Scalar::random(rng)?;
            self.t_point = Point::mul_base(&self.t);
            self.c1 = self.ht + self.t_point;
        }
        self.spent = true;
        Ok(self)
    }
}

/// Encrypted key captured from a ciphertext header.
pub(crate) struct DecryptionCommitment {
    pub(crate) tag: Vec<u8>,
    pub(crate) c1: Point,
}

enum Mode {
    Idle,
    Encrypting(EncryptionCommitment),
    Decrypting(DecryptionCommitment),
}

/// Mutable state behind one scheme instance.
pub(crate) struct Session {
    keys: Option<KeyPair>,
    mode: Mode,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            keys: None,
            mode: Mode::Idle,
        }
    }
}

impl Session {
    pub(crate) fn state(&self) -> &'static str {
        match (&self.keys, &self.mode) {
            (None, _) => "fresh",
            (Some(_), Mode::Idle) => "keyed",
            (Some(_), Mode::Encrypting(_)) => "encrypting",
            (Some(_), Mode::Decrypting(_)) => "decrypting",
        }
    }

    /// Installs a key pair and drops any commitment made under the previous one.
    pub(crate) fn set_keys(&mut self, keys: KeyPair) {
        self.keys = Some(keys);
        self.mode = Mode::Idle;
        debug!(state = self.state(), "session keyed");
    }

    pub(crate) fn enter_encryption<R: RngCore + CryptoRng>(
        &mut self,
        tag: &[u8],
        rng: &mut R,
    ) -> Result<()> {
        let keys = self.keys("init_for_encryption")?;
        let commitment = EncryptionCommitment::new(keys, tag, rng)?;
        self.mode = Mode::Encrypting(commitment);
        debug!(tag_len = tag.len(), state = self.state(), "session entered encryption");
        Ok(())
    }

    pub(crate) fn enter_decryption(&mut self, tag: &[u8], c1: Point) -> Result<()> {
        self.keys("init_for_decryption")?;
        self.mode = Mode::Decrypting(DecryptionCommitment {
            tag: tag.to_vec(),
            c1,
        });
        debug!(tag_len = tag.len(), state = self.state(), "session entered decryption");
        Ok(())
    }

    pub(crate) fn keys(&self, operation: &'static str) -> Result<&KeyPair> {
        self.keys.as_ref().ok_or(Error::WrongState {
            operation,
            state: self.state(),
        })
    }

    pub(crate) fn encrypting(
        &mut self,
        operation: &'static str,
    ) -> Result<(&KeyPair, &mut EncryptionCommitment)> {
        let state = self.state();
        match (&self.keys, &mut self.mode) {
            (Some(keys), Mode::Encrypting(commitment)) => Ok((keys, commitment)),
            _ => Err(Error::WrongState { operation, state }),
        }
    }

    pub(crate) fn decrypting(
        &self,
        operation: &'static str,
    ) -> Result<(&KeyPair, &DecryptionCommitment)> {
        match (&self.keys, &self.mode) {
            (Some(keys), Mode::Decrypting(commitment)) => Ok((keys, commitment)),
            _ => Err(Error::WrongState {
                operation,
                state: self.state(),
            }),
        }
    }

    /// The commitment currently published as the encrypted key, if any.
    pub(crate) fn encrypted_key(&self, operation: &'static str) -> Result<Point> {
        match (&self.keys, &self.mode) {
            (Some(_), Mode::Encrypting(commitment)) => Ok(commitment.c1),
            (Some(_), Mode::Decrypting(commitment)) => Ok(commitment.c1),
            _ => Err(Error::WrongState {
                operation,
                state: self.state(),
            }),
        }
    }
}
