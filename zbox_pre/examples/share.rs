use zbox_pre::{fragment, new_encryption_scheme, EncryptedMessage, EncryptionScheme};

fn main() -> anyhow::Result<()> {
    let tag = "filetype:audio";

    let mut owner = new_encryption_scheme();
    owner.initialize("inside february piece turkey offer merry select combine tissue wave wet shift room afraid december gown mean brick speak grant gain become toy clown")?;
    owner.init_for_encryption(tag)?;

    let content = b"encrypted_data_uttam".repeat(10);
    let encrypted = owner.encrypt(&content)?;

    // the storage node keeps the fragment, the encrypted key goes into file metadata
    let stored = encrypted.to_fragment()?;
    println!(
        "stored fragment: {} bytes, {} plaintext bytes fit in a 64 KiB fragment",
        stored.len(),
        fragment::max_plaintext_len(64 * 1024)
    );

    let mut recipient = new_encryption_scheme();
    recipient.initialize("travel twenty hen negative fresh sentence hen flat swift embody increase juice eternal satisfy want vessel matter honey video begin dutch trigger romance assault")?;
    let recipient_pk = recipient.get_public_key()?;
    let re_key = owner.get_re_gen_key(&recipient_pk, tag)?;

    let proxy = new_encryption_scheme();
    let fetched = EncryptedMessage::from_fragment(&stored, &encrypted.encrypted_key)?;
    let shared = proxy.re_encrypt(&fetched, &re_key, &recipient_pk)?.marshal();
    assert_eq!(shared.len(), fragment::re_encrypted_len(stored.len()));

    recipient.init_for_decryption(tag, &encrypted.encrypted_key)?;
    let decrypted = recipient.re_decrypt(&zbox_pre::ReEncryptedMessage::unmarshal(&shared)?)?;

    assert_eq!(content, decrypted);
    println!("Re-encryption and decryption were successful");
    Ok(())
}
