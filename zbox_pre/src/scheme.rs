//! Tag-based proxy re-encryption.
//!
//! An owner encrypts under its own key and a tag. Given a re-encryption key the
//! owner issued for a recipient and that tag, a proxy turns the ciphertext into one
//! only the recipient can open, without learning the plaintext or the owner's key.

use std::fmt;

use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use tracing::{info_span, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::group::{Point, Scalar};
use crate::hash::{self, CHECKSUM_SIZE};
use crate::message::{EncryptedMessage, ReEncryptedMessage, ReKey};
use crate::mnemonic;
use crate::session::{KeyPair, Session};
use crate::symmetric;

/// Operations a host uses to encrypt, share and read file content.
pub trait EncryptionScheme {
    /// Derives the key pair from a mnemonic phrase.
    fn initialize(&mut self, mnemonic: &str) -> Result<()>;

    /// Restores the key pair from a 32-byte canonical private key.
    fn initialize_with_private_key(&mut self, private_key: &[u8]) -> Result<()>;

    /// Enters encryption mode under `tag`.
    fn init_for_encryption(&mut self, tag: &str) -> Result<()>;

    /// Enters decryption mode for ciphertexts carrying `encrypted_key` under `tag`.
    fn init_for_decryption(&mut self, tag: &str, encrypted_key: &str) -> Result<()>;

    /// Encrypts one plaintext. Every call uses a fresh commitment, so the returned
    /// message carries its own encrypted key.
    fn encrypt(&mut self, data: &[u8]) -> Result<EncryptedMessage>;

    /// Decrypts a first-level ciphertext. A message carrying a re-encryption key is
    /// re-encrypted to this session's key first.
    fn decrypt(&self, msg: &EncryptedMessage) -> Result<Vec<u8>>;

    /// Proxy transformation of `msg` for the holder of `public_key`.
    fn re_encrypt(
        &self,
        msg: &EncryptedMessage,
        re_key: &str,
        public_key: &str,
    ) -> Result<ReEncryptedMessage>;

    /// Decrypts a message the proxy re-encrypted for this session's key.
    fn re_decrypt(&self, msg: &ReEncryptedMessage) -> Result<Vec<u8>>;

    /// Issues a JSON re-encryption key to the holder of `public_key` for `tag`.
    fn get_re_gen_key(&self, public_key: &str, tag: &str) -> Result<String>;

    fn get_encrypted_key(&self) -> Result<String>;

    fn get_public_key(&self) -> Result<String>;

    /// base64 of the private key, for persistence.
    fn get_private_key(&self) -> Result<String>;
}

/// [`EncryptionScheme`] over ed25519 with AES-256-GCM payloads.
///
/// A session is single-owner: mutating operations take `&mut self` and the type has
/// no interior mutability.
#[derive(Default)]
pub struct PreEncryptionScheme {
    session: Session,
}

impl PreEncryptionScheme {
    pub fn new() -> Self {
        Self::default()
    }

    fn first_level_decrypt(&self, msg: &EncryptedMessage) -> Result<Vec<u8>> {
        let (keys, commitment) = self.session.decrypting("decrypt")?;
        let (c3, c4) = msg.checksums()?;

        let alpha = hash::h6(&commitment.tag, &keys.sk);
        let expected = hash::h5(&commitment.c1, &msg.encrypted_data, &c3, &alpha);
        if !bool::from(expected[..].ct_eq(&c4[..])) {
            return Err(Error::AuthFailed);
        }

        let t = commitment.c1 - hash::h1(&commitment.tag, &keys.sk);
        open_verified(&t, &msg.encrypted_data, &c3)
    }

    fn second_level_decrypt(&self, keys: &KeyPair, msg: &ReEncryptedMessage) -> Result<Vec<u8>> {
        let x = msg.d5 * keys.sk;
        let beta = hash::h7(&x, &msg.d2, &msg.d3, &msg.d4, &msg.d5);
        let beta_inv = beta.invert().ok_or(Error::AuthFailed)?;
        let sk_inv = Zeroizing::new(keys.sk.invert().ok_or(Error::AuthFailed)?);

        let t = msg.d1 * beta_inv - msg.d4 * *sk_inv;
        open_verified(&t, &msg.d2, &msg.d3)
    }
}

impl EncryptionScheme for PreEncryptionScheme {
    fn initialize(&mut self, mnemonic: &str) -> Result<()> {
        info_span!("pre::initialize").in_scope(|| {
            let sk = mnemonic::derive_secret(mnemonic)?;
            self.session.set_keys(KeyPair::from_secret(sk)?);
            Ok(())
        })
    }

    fn initialize_with_private_key(&mut self, private_key: &[u8]) -> Result<()> {
        info_span!("pre::initialize_with_private_key").in_scope(|| {
            let sk = Scalar::from_canonical_bytes(private_key)
                .map_err(|_| Error::key_init("private key is not a canonical scalar"))?;
            self.session.set_keys(KeyPair::from_secret(sk)?);
            Ok(())
        })
    }

    fn init_for_encryption(&mut self, tag: &str) -> Result<()> {
        info_span!("pre::init_for_encryption")
            .in_scope(|| self.session.enter_encryption(tag.as_bytes(), &mut OsRng))
    }

    fn init_for_decryption(&mut self, tag: &str, encrypted_key: &str) -> Result<()> {
        info_span!("pre::init_for_decryption").in_scope(|| {
            self.session.keys("init_for_decryption")?;
            let c1 = Point::from_base64(encrypted_key)?;
            self.session.enter_decryption(tag.as_bytes(), c1)
        })
    }

    fn encrypt(&mut self, data: &[u8]) -> Result<EncryptedMessage> {
        info_span!("pre::encrypt", len = data.len()).in_scope(|| {
            let (keys, commitment) = self.session.encrypting("encrypt")?;
            let commitment = commitment.take(&mut OsRng)?;

            let key = hash::h2(&commitment.t_point);
            let c2 = symmetric::seal(&key, data)?;
            let c3 = hash::h3(data, &commitment.t_point);
            let alpha = hash::h6(&commitment.tag, &keys.sk);
            let c4 = hash::h5(&commitment.c1, &c2, &c3, &alpha);

            Ok(EncryptedMessage {
                encrypted_key: commitment.c1.to_base64(),
                encrypted_data: c2,
                message_checksum: hex::encode(c3),
                overall_checksum: hex::encode(c4),
                re_encryption_key: None,
            })
        })
    }

    fn decrypt(&self, msg: &EncryptedMessage) -> Result<Vec<u8>> {
        info_span!("pre::decrypt", len = msg.encrypted_data.len()).in_scope(|| {
            let Some(re_key) = &msg.re_encryption_key else {
                return self.first_level_decrypt(msg);
            };
            let (keys, _) = self.session.decrypting("decrypt")?;
            let re_key = ReKey::from_json(re_key)?;
            let transformed = transform(msg, &re_key, &keys.pk).map_err(|e| match e {
                Error::ChecksumMismatch => Error::AuthFailed,
                e => e,
            })?;
            self.second_level_decrypt(keys, &transformed)
        })
    }

    fn re_encrypt(
        &self,
        msg: &EncryptedMessage,
        re_key: &str,
        public_key: &str,
    ) -> Result<ReEncryptedMessage> {
        info_span!("pre::re_encrypt", len = msg.encrypted_data.len()).in_scope(|| {
            let re_key = ReKey::from_json(re_key)?;
            let pk = parse_public_key(public_key)?;
            transform(msg, &re_key, &pk)
        })
    }

    fn re_decrypt(&self, msg: &ReEncryptedMessage) -> Result<Vec<u8>> {
        info_span!("pre::re_decrypt", len = msg.d2.len()).in_scope(|| {
            let (keys, _) = self.session.decrypting("re_decrypt")?;
            self.second_level_decrypt(keys, msg)
        })
    }

    fn get_re_gen_key(&self, public_key: &str, tag: &str) -> Result<String> {
        info_span!("pre::get_re_gen_key").in_scope(|| {
            let keys = self.session.keys("get_re_gen_key")?;
            let pk = parse_public_key(public_key)?;

            let r = Zeroizing::new(Scalar::random(&mut OsRng)?);
            let hc = hash::h1(tag.as_bytes(), &keys.sk);
            let re_key = ReKey {
                r1: Point::mul_base(&r) - hc,
                r2: pk * *r,
                r3: *hash::h6(tag.as_bytes(), &keys.sk),
            };
            re_key.to_json()
        })
    }

    fn get_encrypted_key(&self) -> Result<String> {
        self.session
            .encrypted_key("get_encrypted_key")
            .map(|c1| c1.to_base64())
    }

    fn get_public_key(&self) -> Result<String> {
        Ok(self.session.keys("get_public_key")?.pk.to_base64())
    }

    fn get_private_key(&self) -> Result<String> {
        Ok(self.session.keys("get_private_key")?.sk.to_base64())
    }
}

impl fmt::Debug for PreEncryptionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreEncryptionScheme")
            .field("state", &self.session.state())
            .finish_non_exhaustive()
    }
}

fn parse_public_key(encoded: &str) -> Result<Point> {
    let pk = Point::from_base64(encoded)?;
    if pk.is_identity() {
        return Err(Error::parse("public key is the identity"));
    }
    Ok(pk)
}

/// Proxy side of the scheme. Needs no key material besides the re-encryption key.
fn transform(msg: &EncryptedMessage, re_key: &ReKey, pk: &Point) -> Result<ReEncryptedMessage> {
    let c1 = msg.encrypted_key_point()?;
    let (c3, c4) = msg.checksums()?;

    let expected = hash::h5(&c1, &msg.encrypted_data, &c3, &re_key.r3);
    if !bool::from(expected[..].ct_eq(&c4[..])) {
        warn!("re-encryption key does not match the ciphertext");
        return Err(Error::ChecksumMismatch);
    }

    let t = Zeroizing::new(Scalar::random(&mut OsRng)?);
    let d5 = Point::mul_base(&t);
    let d4 = re_key.r2;
    let x = *pk * *t;
    let beta = hash::h7(&x, &msg.encrypted_data, &c3, &d4, &d5);

    Ok(ReEncryptedMessage {
        d1: (c1 + re_key.r1) * beta,
        d2: msg.encrypted_data.clone(),
        d3: c3,
        d4,
        d5,
    })
}

/// Opens `sealed` under the key derived from `t` and checks the message checksum.
fn open_verified(t: &Point, sealed: &[u8], checksum: &[u8; CHECKSUM_SIZE]) -> Result<Vec<u8>> {
    let key = hash::h2(t);
    let mut plaintext = symmetric::open(&key, sealed)?;
    if !bool::from(hash::h3(&plaintext, t)[..].ct_eq(&checksum[..])) {
        plaintext.zeroize();
        return Err(Error::AuthFailed);
    }
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> PreEncryptionScheme {
        let mut scheme = PreEncryptionScheme::new();
        let sk = Scalar::random(&mut OsRng).unwrap();
        scheme.initialize_with_private_key(sk.as_bytes()).unwrap();
        scheme
    }

    #[test]
    fn test_encrypt_decrypt() {
        let mut owner = keyed();
        owner.init_for_encryption("tag").unwrap();
        let msg = owner.encrypt(b"hello").unwrap();
        assert_eq!(msg.encrypted_data.len(), 5 + symmetric::TAG_SIZE);
        assert_eq!(msg.message_checksum.len(), 128);
        assert_eq!(msg.overall_checksum.len(), 128);

        owner.init_for_decryption("tag", &msg.encrypted_key).unwrap();
        assert_eq!(owner.decrypt(&msg).unwrap(), b"hello");
    }

    #[test]
    fn test_rekey_cancels_tag_point() {
        // C1 + R1 = T + r·G once the tag points cancel
        let mut owner = keyed();
        let recipient = keyed();
        owner.init_for_encryption("tag").unwrap();
        let c1 = Point::from_base64(&owner.get_encrypted_key().unwrap()).unwrap();

        let re_key = owner
            .get_re_gen_key(&recipient.get_public_key().unwrap(), "tag")
            .unwrap();
        let re_key = ReKey::from_json(&re_key).unwrap();

        let (keys, commitment) = owner.session.encrypting("test").unwrap();
        let sk_b = Scalar::from_base64(&recipient.get_private_key().unwrap()).unwrap();
        let r_g = re_key.r2 * sk_b.invert().unwrap();
        assert_eq!(c1 + re_key.r1, commitment.t_point + r_g);
        assert_eq!(re_key.r3, *hash::h6(b"tag", &keys.sk));
    }

    #[test]
    fn test_decrypt_errors_are_opaque() {
        let mut owner = keyed();
        owner.init_for_encryption("tag").unwrap();
        let msg = owner.encrypt(b"hello").unwrap();
        owner.init_for_decryption("tag", &msg.encrypted_key).unwrap();

        let mut bad_overall = msg.clone();
        bad_overall.overall_checksum = hex::encode([0u8; CHECKSUM_SIZE]);
        let mut bad_data = msg.clone();
        bad_data.encrypted_data[0] ^= 1;

        assert_eq!(owner.decrypt(&bad_overall), Err(Error::AuthFailed));
        assert_eq!(owner.decrypt(&bad_data), Err(Error::AuthFailed));
    }

    #[test]
    fn test_open_verified_checks_message_checksum() {
        let t = Point::mul_base(&Scalar::random(&mut OsRng).unwrap());
        let sealed = symmetric::seal(&hash::h2(&t), b"payload").unwrap();
        let good = hash::h3(b"payload", &t);
        assert_eq!(open_verified(&t, &sealed, &good).unwrap(), b"payload");
        assert_eq!(
            open_verified(&t, &sealed, &[0u8; CHECKSUM_SIZE]),
            Err(Error::AuthFailed)
        );
    }

    #[test]
    fn test_identity_public_key_rejected() {
        let mut owner = keyed();
        owner.init_for_encryption("tag").unwrap();
        let identity = Point::identity().to_base64();
        assert!(matches!(
            owner.get_re_gen_key(&identity, "tag"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_private_key_round_trip() {
        let owner = keyed();
        let sk = owner.get_private_key().unwrap();
        let mut restored = PreEncryptionScheme::new();
        restored
            .initialize_with_private_key(&Scalar::from_base64(&sk).unwrap().to_bytes())
            .unwrap();
        assert_eq!(
            restored.get_public_key().unwrap(),
            owner.get_public_key().unwrap()
        );
    }

    #[test]
    fn test_debug_hides_keys() {
        let owner = keyed();
        let rendered = format!("{owner:?}");
        assert!(rendered.contains("keyed"));
        assert!(!rendered.contains(&owner.get_private_key().unwrap()));
    }
}
