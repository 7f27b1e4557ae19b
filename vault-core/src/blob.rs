//! AES-256-GCM blobs stored as `nonce(12) || tag(16) || ciphertext`.
//!
//! The AEAD primitive emits `ciphertext || tag`; the tag is moved behind the nonce when
//! sealing and moved back before opening.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::keys::KEY_SIZE;

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Parsed view of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::BlobTooShort(bytes.len()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&bytes[NONCE_SIZE..NONCE_SIZE + TAG_SIZE]);

        Ok(Self {
            nonce,
            tag,
            ciphertext: bytes[NONCE_SIZE + TAG_SIZE..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Encrypt `plaintext` under `key` with the given nonce.
    pub fn seal(key: &[u8], nonce: [u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Self, VaultError> {
        let cipher = cipher(key)?;
        let mut sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &[],
                },
            )
            .map_err(|_| VaultError::Authentication)?;

        let split = sealed.len() - TAG_SIZE;
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&sealed[split..]);
        sealed.truncate(split);

        Ok(Self {
            nonce,
            tag,
            ciphertext: sealed,
        })
    }

    /// Authenticate and decrypt. Nothing is returned unless the tag verifies.
    pub fn open(&self, key: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let cipher = cipher(key)?;
        let mut sealed = Vec::with_capacity(self.ciphertext.len() + TAG_SIZE);
        sealed.extend_from_slice(&self.ciphertext);
        sealed.extend_from_slice(&self.tag);

        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &sealed,
                    aad: &[],
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| VaultError::Authentication)
    }
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm, VaultError> {
    if key.len() != KEY_SIZE {
        return Err(VaultError::KeyLength(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::KeyLength(key.len()))
}

/// Encrypt with a nonce drawn from `rng`, returning the stored byte layout.
pub fn encrypt_blob_with_rng<R>(plaintext: &[u8], key: &[u8], rng: &mut R) -> Result<Vec<u8>, VaultError>
where
    R: RngCore + CryptoRng,
{
    let mut nonce = [0u8; NONCE_SIZE];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|err| VaultError::Entropy(err.to_string()))?;
    Ok(EncryptedBlob::seal(key, nonce, plaintext)?.to_bytes())
}

pub fn encrypt_blob(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, VaultError> {
    encrypt_blob_with_rng(plaintext, key, &mut OsRng)
}

pub fn decrypt_blob(blob: &[u8], key: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    EncryptedBlob::from_bytes(blob)?.open(key)
}
