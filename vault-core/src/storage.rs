use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroizing;

use crate::blob::{decrypt_blob, encrypt_blob_with_rng};
use crate::error::VaultError;
use crate::keys::VaultKeys;
use crate::model::VaultStorage;

/// Serialise the container to JSON and seal it with `key`.
pub fn encrypt_vault_with_rng<R>(
    storage: &VaultStorage,
    key: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, VaultError>
where
    R: RngCore + CryptoRng,
{
    let plaintext = Zeroizing::new(serde_json::to_vec(storage)?);
    encrypt_blob_with_rng(&plaintext, key, rng)
}

pub fn encrypt_vault(storage: &VaultStorage, key: &[u8]) -> Result<Vec<u8>, VaultError> {
    encrypt_vault_with_rng(storage, key, &mut OsRng)
}

/// Open a sealed container and parse its JSON.
pub fn decrypt_vault(content: &[u8], key: &[u8]) -> Result<VaultStorage, VaultError> {
    let plaintext = decrypt_blob(content, key)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Location of the vault file inside `dir`.
pub fn vault_file(dir: &Path, keys: &VaultKeys) -> PathBuf {
    dir.join(&keys.filename)
}

pub fn read_vault(dir: &Path, keys: &VaultKeys) -> Result<VaultStorage, VaultError> {
    let path = vault_file(dir, keys);
    let content = fs::read(&path)?;
    debug!("read {} bytes from {}", content.len(), path.display());
    decrypt_vault(&content, keys.enc_key())
}

pub fn write_vault_with_rng<R>(
    dir: &Path,
    keys: &VaultKeys,
    storage: &VaultStorage,
    rng: &mut R,
) -> Result<PathBuf, VaultError>
where
    R: RngCore + CryptoRng,
{
    let path = vault_file(dir, keys);
    let content = encrypt_vault_with_rng(storage, keys.enc_key(), rng)?;
    fs::write(&path, &content)?;
    info!("wrote {} entries to {}", storage.entries.len(), path.display());
    Ok(path)
}

pub fn write_vault(dir: &Path, keys: &VaultKeys, storage: &VaultStorage) -> Result<PathBuf, VaultError> {
    write_vault_with_rng(dir, keys, storage, &mut OsRng)
}
