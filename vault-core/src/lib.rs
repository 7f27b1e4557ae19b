//! Device-backed password vault.
//!
//! The device never reveals its key. The host asks it to encrypt a fixed value at
//! `m/10016'/0`; the result is the master secret from which the vault file name and the
//! AES-256-GCM container key are derived. Each entry carries its own key, stored encrypted by
//! the device in the entry's `nonce` field.

pub mod blob;
pub mod device;
pub mod error;
pub mod keys;
pub mod model;
pub mod storage;

pub use blob::{EncryptedBlob, decrypt_blob, encrypt_blob, encrypt_blob_with_rng};
pub use device::{
    VAULT_PATH, fetch_master_secret, open_vault, request_master_secret, seal_entry,
    unlock_entry, unlock_entry_nonce,
};
pub use error::VaultError;
pub use keys::{VaultKeys, derive_file_key};
pub use model::{
    Config, EncryptedField, Entry, NewEntry, SecretString, Tag, UnlockedEntry, VaultStorage,
};
pub use storage::{decrypt_vault, encrypt_vault, encrypt_vault_with_rng, read_vault, write_vault};
