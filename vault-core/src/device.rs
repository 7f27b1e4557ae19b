//! Vault operations that need the device: every vault secret is a CipherKeyValue result.

use log::{debug, info};
use rand_core::{CryptoRng, RngCore};
use shared::interaction::{InteractionController, Prompter};
use shared::path::{Path, hardened};
use shared::{DeviceProfile, Link, Message, Request};
use zeroize::Zeroizing;

use crate::blob::{decrypt_blob, encrypt_blob_with_rng};
use crate::error::VaultError;
use crate::keys::{KEY_SIZE, VaultKeys, derive_file_key};
use crate::model::{EncryptedField, Entry, NewEntry, SecretString, UnlockedEntry};

/// Derivation path used for the master secret and for every entry key.
pub const VAULT_PATH: &str = "m/10016'/0";

/// CipherKeyValue values must be a multiple of this many bytes.
const CIPHER_BLOCK: usize = 16;

pub fn vault_path() -> Path {
    Path::new(vec![hardened(10016), 0])
}

fn pad_to_block(value: &[u8]) -> Vec<u8> {
    let padded_len = value.len().div_ceil(CIPHER_BLOCK) * CIPHER_BLOCK;
    let mut padded = value.to_vec();
    padded.resize(padded_len, 0);
    padded
}

/// Ask the device to encrypt the profile's master value, confirming on both directions.
pub fn request_master_secret(profile: &DeviceProfile) -> Result<Request, VaultError> {
    let value = profile.master_value()?;
    Ok(Request::CipherKeyValue {
        path: vault_path(),
        key: format!("Activate {} Password Manager?", profile.name),
        value: pad_to_block(&value),
        encrypt: true,
        ask_on_encrypt: true,
        ask_on_decrypt: true,
        iv: None,
    })
}

/// CipherKeyValue for an entry key.
///
/// With `decrypt` the nonce is the stored hex text and is hex-decoded. Without it the nonce
/// is the raw entry key and is zero-padded to the cipher block size.
pub fn unlock_entry_nonce(
    title: &str,
    username: &str,
    nonce: &[u8],
    decrypt: bool,
) -> Result<Request, VaultError> {
    let value = if decrypt {
        hex::decode(nonce)?
    } else {
        pad_to_block(nonce)
    };

    Ok(Request::CipherKeyValue {
        path: vault_path(),
        key: format!("Unlock {title} for user {username}?"),
        value,
        encrypt: !decrypt,
        ask_on_encrypt: false,
        ask_on_decrypt: true,
        iv: None,
    })
}

fn ciphered_value(message: Message) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    match message {
        Message::CipheredKeyValue(value) => Ok(Zeroizing::new(value)),
        Message::Failure { message, .. } => Err(VaultError::Refused(message)),
        other => Err(VaultError::UnexpectedResponse(other.summary())),
    }
}

/// Run the master-secret request and return the ciphered value as hex text.
pub fn fetch_master_secret<L, P, R>(
    controller: &mut InteractionController<L, P, R>,
) -> Result<Zeroizing<String>, VaultError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    let request = request_master_secret(controller.session().profile())?;
    let value = ciphered_value(controller.call(request)?)?;
    debug!("device returned {} byte master secret", value.len());
    Ok(Zeroizing::new(hex::encode(value.as_slice())))
}

/// Fetch the master secret and derive the vault file name and container key.
pub fn open_vault<L, P, R>(
    controller: &mut InteractionController<L, P, R>,
) -> Result<VaultKeys, VaultError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    let master = fetch_master_secret(controller)?;
    let keys = derive_file_key(&master)?;
    info!("vault file is {}", keys.filename);
    Ok(keys)
}

/// Sealed fields hold JSON string literals; fall back to the raw text when they do not parse.
fn unquote(plaintext: &[u8]) -> SecretString {
    match serde_json::from_slice::<String>(plaintext) {
        Ok(text) => SecretString::new(text),
        Err(_) => SecretString::new(String::from_utf8_lossy(plaintext).into_owned()),
    }
}

fn open_field(field: &EncryptedField, key: &[u8]) -> Result<SecretString, VaultError> {
    if field.data.is_empty() {
        return Ok(SecretString::default());
    }
    let plaintext = decrypt_blob(&field.data, key)?;
    Ok(unquote(&plaintext))
}

/// Have the device decrypt the entry key and open the password and safe note with it.
pub fn unlock_entry<L, P, R>(
    controller: &mut InteractionController<L, P, R>,
    entry: &Entry,
) -> Result<UnlockedEntry, VaultError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    let request = unlock_entry_nonce(&entry.title, &entry.username, entry.nonce.as_bytes(), true)?;
    let key = ciphered_value(controller.call(request)?)?;

    Ok(UnlockedEntry {
        title: entry.title.clone(),
        username: entry.username.clone(),
        note: entry.note.clone(),
        password: open_field(&entry.password, &key)?,
        safe_note: open_field(&entry.safe_note, &key)?,
        tags: entry.tags.clone(),
    })
}

fn seal_field<G>(value: &str, key: &[u8], rng: &mut G) -> Result<EncryptedField, VaultError>
where
    G: RngCore + CryptoRng,
{
    let literal = Zeroizing::new(serde_json::to_string(value)?);
    let sealed = encrypt_blob_with_rng(literal.as_bytes(), key, rng)?;
    Ok(EncryptedField::new(sealed))
}

/// Generate a fresh entry key, have the device encrypt it into the stored nonce, and seal
/// the password and safe note with it.
pub fn seal_entry<L, P, R, G>(
    controller: &mut InteractionController<L, P, R>,
    draft: &NewEntry,
    rng: &mut G,
) -> Result<Entry, VaultError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    G: RngCore + CryptoRng,
{
    let mut entry_key = Zeroizing::new([0u8; KEY_SIZE]);
    rng.try_fill_bytes(entry_key.as_mut_slice())
        .map_err(|err| VaultError::Entropy(err.to_string()))?;

    let request = unlock_entry_nonce(&draft.title, &draft.username, entry_key.as_slice(), false)?;
    let encrypted_key = ciphered_value(controller.call(request)?)?;

    Ok(Entry {
        title: draft.title.clone(),
        username: draft.username.clone(),
        nonce: hex::encode(encrypted_key.as_slice()),
        note: draft.note.clone(),
        password: seal_field(draft.password.expose(), entry_key.as_slice(), rng)?,
        safe_note: seal_field(draft.safe_note.expose(), entry_key.as_slice(), rng)?,
        tags: draft.tags.clone(),
    })
}
