use shared::SharedError;
use thiserror::Error;

/// Errors raised while deriving vault keys, sealing blobs, or talking to the device.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Master secret was empty or not hex text.
    #[error("master secret must be non-empty hex text")]
    InvalidMasterSecret,
    /// Hex field could not be decoded.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Key material was not 32 bytes long.
    #[error("key must be 32 bytes, got {0}")]
    KeyLength(usize),
    /// Blob cannot hold a nonce and tag.
    #[error("blob of {0} bytes is shorter than nonce and tag")]
    BlobTooShort(usize),
    /// GCM tag did not verify.
    #[error("authentication failed")]
    Authentication,
    /// Vault JSON could not be read or written.
    #[error("serialization error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Random source failed while sealing.
    #[error("entropy source failed: {0}")]
    Entropy(String),
    /// Device exchange failed.
    #[error("device error: {0}")]
    Device(#[from] SharedError),
    /// Device answered with a Failure.
    #[error("device refused the request: {0}")]
    Refused(String),
    /// Device answered with something other than a ciphered value.
    #[error("unexpected device response: {0}")]
    UnexpectedResponse(String),
    /// No entry carries the requested identifier.
    #[error("entry {0} not found")]
    EntryNotFound(String),
    /// Vault file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
