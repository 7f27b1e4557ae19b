use thiserror::Error;

use crate::frame::FrameError;
use crate::link::LinkError;
use crate::schema::{MessageType, SchemaError};

#[derive(Debug, Error)]
pub enum SharedError {
    #[error("transport error: {0}")]
    Transport(#[from] LinkError),
    #[error("framing error: {0}")]
    Frame(FrameError),
    #[error("encode error: {0}")]
    Schema(#[from] SchemaError),
    #[error("failed to decode {message_type:?} response: {reason}")]
    Decode {
        message_type: MessageType,
        reason: String,
    },
    #[error("prompt aborted: {0}")]
    Prompt(String),
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

impl From<FrameError> for SharedError {
    fn from(value: FrameError) -> Self {
        match value {
            FrameError::Link(err) => SharedError::Transport(err),
            other => SharedError::Frame(other),
        }
    }
}

impl SharedError {
    /// True when the underlying link reported that the device went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            SharedError::Transport(LinkError::Disconnected(_) | LinkError::Endpoint(_))
        )
    }
}
