//! Property-based tests for the re-encryption flows.
//!
//! Ciphertexts are randomized, so these check behavior rather than bytes.

use proptest::prelude::*;
use zbox_pre::{
    new_encryption_scheme, EncryptedMessage, EncryptionScheme, PreEncryptionScheme,
    ReEncryptedMessage,
};

/// 32 bytes below 2^252, hence a canonical scalar.
fn secret_key() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
        .prop_map(|mut bytes| {
            bytes[31] &= 0x0f;
            bytes
        })
        .prop_filter("zero is not a valid key", |bytes| bytes != &[0u8; 32])
}

fn tag() -> impl Strategy<Value = String> {
    "[a-z]{1,12}:[a-z]{1,12}"
}

fn session(sk: &[u8; 32]) -> PreEncryptionScheme {
    let mut scheme = new_encryption_scheme();
    scheme.initialize_with_private_key(sk).unwrap();
    scheme
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: decrypt(encrypt(x)) == x for a second session on the same key
    #[test]
    fn prop_first_level_roundtrip(
        sk in secret_key(),
        tag in tag(),
        data in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let mut encryptor = session(&sk);
        encryptor.init_for_encryption(&tag).unwrap();
        let msg = encryptor.encrypt(&data).unwrap();

        let mut decryptor = session(&sk);
        decryptor.init_for_decryption(&tag, &msg.encrypted_key).unwrap();
        prop_assert_eq!(decryptor.decrypt(&msg).unwrap(), data);
    }

    /// Property: re_decrypt_bob(re_encrypt(encrypt_alice(x))) == x
    #[test]
    fn prop_proxy_roundtrip(
        alice in secret_key(),
        bob in secret_key(),
        tag in tag(),
        data in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let mut owner = session(&alice);
        owner.init_for_encryption(&tag).unwrap();
        let msg = owner.encrypt(&data).unwrap();

        let mut recipient = session(&bob);
        let pk = recipient.get_public_key().unwrap();
        let re_key = owner.get_re_gen_key(&pk, &tag).unwrap();
        let shared = new_encryption_scheme().re_encrypt(&msg, &re_key, &pk).unwrap();

        recipient.init_for_decryption(&tag, &msg.encrypted_key).unwrap();
        prop_assert_eq!(recipient.re_decrypt(&shared).unwrap(), data);
    }

    /// Property: any flipped bit in data or checksums is rejected
    #[test]
    fn prop_tamper_detected(
        sk in secret_key(),
        data in prop::collection::vec(any::<u8>(), 1..512),
        field in 0usize..3,
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut scheme = session(&sk);
        scheme.init_for_encryption("filetype:audio").unwrap();
        let msg = scheme.encrypt(&data).unwrap();

        let flip = |hex_checksum: &str| {
            let mut bytes = hex::decode(hex_checksum).unwrap();
            let i = position.index(bytes.len());
            bytes[i] ^= 1 << bit;
            hex::encode(bytes)
        };
        let mut tampered = msg.clone();
        match field {
            0 => {
                let i = position.index(tampered.encrypted_data.len());
                tampered.encrypted_data[i] ^= 1 << bit;
            }
            1 => tampered.message_checksum = flip(&msg.message_checksum),
            _ => tampered.overall_checksum = flip(&msg.overall_checksum),
        }

        scheme.init_for_decryption("filetype:audio", &msg.encrypted_key).unwrap();
        prop_assert!(scheme.decrypt(&tampered).is_err());
    }

    /// Property: a recipient other than the re-key's cannot decrypt
    #[test]
    fn prop_cross_recipient_isolation(
        alice in secret_key(),
        bob in secret_key(),
        eve in secret_key(),
        data in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        prop_assume!(bob != eve);
        let mut owner = session(&alice);
        owner.init_for_encryption("filetype:audio").unwrap();
        let msg = owner.encrypt(&data).unwrap();

        let pk = session(&bob).get_public_key().unwrap();
        let re_key = owner.get_re_gen_key(&pk, "filetype:audio").unwrap();
        let shared = new_encryption_scheme().re_encrypt(&msg, &re_key, &pk).unwrap();

        let mut intruder = session(&eve);
        intruder.init_for_decryption("filetype:audio", &msg.encrypted_key).unwrap();
        prop_assert!(intruder.re_decrypt(&shared).is_err());
    }

    /// Property: unmarshal(marshal(m)) == m
    #[test]
    fn prop_framing_roundtrip(
        alice in secret_key(),
        bob in secret_key(),
        data in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut owner = session(&alice);
        owner.init_for_encryption("filetype:audio").unwrap();
        let msg = owner.encrypt(&data).unwrap();
        let pk = session(&bob).get_public_key().unwrap();
        let re_key = owner.get_re_gen_key(&pk, "filetype:audio").unwrap();
        let shared = new_encryption_scheme().re_encrypt(&msg, &re_key, &pk).unwrap();

        prop_assert_eq!(ReEncryptedMessage::unmarshal(&shared.marshal()).unwrap(), shared);
        prop_assert_eq!(
            EncryptedMessage::from_fragment(&msg.to_fragment().unwrap(), &msg.encrypted_key).unwrap(),
            msg
        );
    }
}
