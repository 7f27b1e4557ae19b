use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use vault_core::blob::{NONCE_SIZE, TAG_SIZE};
use vault_core::{
    Config, EncryptedBlob, EncryptedField, Entry, Tag, VaultError, VaultStorage, decrypt_blob,
    decrypt_vault, derive_file_key,
};

const KEY: [u8; 32] = [
    0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d, 0x77,
    0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3, 0x09, 0x14,
    0xdf, 0xf4,
];

/// Build the stored layout by hand from the primitive's `ciphertext || tag` output.
fn stored_layout(nonce: [u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256Gcm::new_from_slice(&KEY).expect("key");
    let native = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .expect("encrypt");
    let (ciphertext, tag) = native.split_at(native.len() - TAG_SIZE);

    let mut stored = nonce.to_vec();
    stored.extend_from_slice(tag);
    stored.extend_from_slice(ciphertext);
    stored
}

fn sample_storage() -> VaultStorage {
    let mut storage = VaultStorage {
        version: "0.0.1".into(),
        config: Config {
            order_type: "date".into(),
        },
        ..VaultStorage::default()
    };
    storage.tags.insert(
        "0".into(),
        Tag {
            title: "All".into(),
            icon: "home".into(),
            active: "active".into(),
        },
    );
    storage.entries.insert(
        "0".into(),
        Entry {
            title: "mail.example.com".into(),
            username: "alice".into(),
            nonce: "aa".repeat(32),
            note: "work".into(),
            password: EncryptedField::new(vec![0; NONCE_SIZE + TAG_SIZE + 4]),
            safe_note: EncryptedField::default(),
            tags: vec![0],
        },
    );
    storage
}

#[test]
fn hand_built_layout_decrypts() {
    let stored = stored_layout([3; NONCE_SIZE], b"\"correct horse\"");
    let plaintext = decrypt_blob(&stored, &KEY).expect("decrypt");
    assert_eq!(plaintext.as_slice(), b"\"correct horse\"");

    let blob = EncryptedBlob::from_bytes(&stored).expect("parse");
    assert_eq!(blob.nonce, [3; NONCE_SIZE]);
    assert_eq!(blob.ciphertext.len(), b"\"correct horse\"".len());
    assert_eq!(blob.to_bytes(), stored);
}

#[test]
fn sealing_matches_hand_built_layout() {
    let nonce = [9; NONCE_SIZE];
    let sealed = EncryptedBlob::seal(&KEY, nonce, b"payload").expect("seal");
    assert_eq!(sealed.to_bytes(), stored_layout(nonce, b"payload"));
}

#[test]
fn container_is_sealed_json() {
    let storage = sample_storage();
    let json = serde_json::to_vec(&storage).expect("json");
    let stored = stored_layout([1; NONCE_SIZE], &json);

    let decoded = decrypt_vault(&stored, &KEY).expect("decrypt");
    assert_eq!(decoded, storage);

    let value: serde_json::Value = serde_json::from_slice(&json).expect("value");
    assert_eq!(value["config"]["orderType"], "date");
    assert_eq!(value["entries"]["0"]["password"]["type"], "Buffer");
    assert_eq!(value["entries"]["0"]["safe_note"]["data"], serde_json::json!([]));
}

#[test]
fn flipped_tag_bit_is_rejected() {
    let mut stored = stored_layout([5; NONCE_SIZE], b"secret");
    stored[NONCE_SIZE] ^= 0x01;
    assert!(matches!(
        decrypt_blob(&stored, &KEY),
        Err(VaultError::Authentication)
    ));
}

#[test]
fn container_key_opens_file_named_by_master_secret() {
    let master = format!("{}{}", "31".repeat(32), hex::encode(KEY));
    let keys = derive_file_key(&master).expect("keys");
    assert_eq!(keys.enc_key(), &KEY);
    assert!(keys.filename.ends_with(".pswd"));

    let json = serde_json::to_vec(&sample_storage()).expect("json");
    let stored = stored_layout([2; NONCE_SIZE], &json);
    assert_eq!(
        decrypt_vault(&stored, keys.enc_key()).expect("decrypt"),
        sample_storage()
    );
}
