use core::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Fixed message authenticated with the file key to name the vault file.
pub const FILENAME_DOMAIN: &[u8] =
    b"5f91add3fa1c3c76e90c90a3bd0999e2bd7833d06a483fe884ee60397aca277a";

/// Extension appended to the vault file name.
pub const VAULT_FILE_EXTENSION: &str = ".pswd";

/// Size in bytes of the AES-256 keys used by the vault.
pub const KEY_SIZE: usize = 32;

/// Everything derived from the device master secret.
pub struct VaultKeys {
    /// `hex(HMAC-SHA256(file_key, domain)).pswd`
    pub filename: String,
    /// First half of the master secret hex text.
    pub file_key: Zeroizing<String>,
    enc_key: Zeroizing<[u8; KEY_SIZE]>,
}

impl VaultKeys {
    /// AES-256-GCM key for the vault container.
    pub fn enc_key(&self) -> &[u8; KEY_SIZE] {
        &self.enc_key
    }
}

impl fmt::Debug for VaultKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultKeys")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Split the master secret hex text in half and derive the file name and container key.
///
/// The first half's text bytes key an HMAC-SHA256 over [`FILENAME_DOMAIN`]; the second half
/// is hex-decoded into the encryption key.
pub fn derive_file_key(master_secret_hex: &str) -> Result<VaultKeys, VaultError> {
    let master = master_secret_hex.trim();
    if master.is_empty() || !master.is_ascii() {
        return Err(VaultError::InvalidMasterSecret);
    }

    let (file_key, enc_key_hex) = master.split_at(master.len() / 2);

    let mut mac = Hmac::<Sha256>::new_from_slice(file_key.as_bytes())
        .map_err(|_| VaultError::InvalidMasterSecret)?;
    mac.update(FILENAME_DOMAIN);
    let digest = mac.finalize().into_bytes();
    let filename = format!("{}{VAULT_FILE_EXTENSION}", hex::encode(digest));

    let decoded = Zeroizing::new(hex::decode(enc_key_hex)?);
    let enc_key: [u8; KEY_SIZE] = decoded
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::KeyLength(decoded.len()))?;

    Ok(VaultKeys {
        filename,
        file_key: Zeroizing::new(file_key.to_owned()),
        enc_key: Zeroizing::new(enc_key),
    })
}
