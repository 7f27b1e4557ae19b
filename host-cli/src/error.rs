use std::io;
use std::path::PathBuf;

use shared::SharedError;
use thiserror::Error;
use vault_core::VaultError;

/// Failures surfaced by the command line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Device(#[from] SharedError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("device refused the request: {message}")]
    Failure { code: Option<i32>, message: String },
    #[error("unexpected device response: {0}")]
    Unexpected(String),
    #[error("invalid derivation path '{0}'")]
    InvalidPath(String),
    #[error("invalid identity URI '{0}'")]
    InvalidIdentity(String),
    #[error("invalid hex argument: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("unknown device '{name}', expected one of: {known}")]
    UnknownDevice { name: String, known: String },
    #[error("failed to read profile '{}': {source}", path.display())]
    ProfileRead { path: PathBuf, source: io::Error },
    #[error("invalid profile '{}': {source}", path.display())]
    ProfileFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
