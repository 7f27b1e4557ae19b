//! Envelope layout and the report framing codec.
//!
//! An envelope is `## | type (u16 BE) | length (u32 BE) | payload`. The codec in [`codec`]
//! slices the encoded envelope across 64-byte reports.

use thiserror::Error;

use crate::link::LinkError;

pub mod codec;

pub use codec::FrameCodec;

/// Magic marker opening every envelope.
pub const ENVELOPE_MAGIC: [u8; 2] = *b"##";

/// Size in bytes of the envelope header including the magic.
pub const ENVELOPE_HEADER_SIZE: usize = 2 + 2 + 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Link failed before an envelope header was seen.
    #[error(transparent)]
    Link(#[from] LinkError),
    /// Payload length exceeds the length field or the configured limit.
    #[error("payload of {actual} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { actual: usize, limit: usize },
    /// Link failed while continuation reports were still expected.
    #[error("link failed after {received} of {declared} payload bytes: {source}")]
    Truncated {
        declared: usize,
        received: usize,
        source: LinkError,
    },
}

/// Envelope header transmitted before every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub message_type: u16,
    pub length: u32,
}

impl EnvelopeHeader {
    pub const fn new(message_type: u16, length: u32) -> Self {
        Self {
            message_type,
            length,
        }
    }

    pub fn to_bytes(self) -> [u8; ENVELOPE_HEADER_SIZE] {
        let mut bytes = [0u8; ENVELOPE_HEADER_SIZE];
        bytes[..2].copy_from_slice(&ENVELOPE_MAGIC);
        bytes[2..4].copy_from_slice(&self.message_type.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.length.to_be_bytes());
        bytes
    }

    /// Decode a header; `None` when the magic is missing or the slice is short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < ENVELOPE_HEADER_SIZE || bytes[..2] != ENVELOPE_MAGIC {
            return None;
        }

        let message_type = u16::from_be_bytes([bytes[2], bytes[3]]);
        let length = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Some(Self::new(message_type, length))
    }
}

/// One logical protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message_type: u16,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(message_type: u16, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Length carried in the header; always equal to the payload length.
    pub fn declared_length(&self) -> usize {
        self.payload.len()
    }

    /// Encode header and payload into one contiguous buffer.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let length = u32::try_from(self.payload.len()).map_err(|_| FrameError::PayloadTooLarge {
            actual: self.payload.len(),
            limit: u32::MAX as usize,
        })?;
        let header = EnvelopeHeader::new(self.message_type, length);

        let mut buffer = Vec::with_capacity(ENVELOPE_HEADER_SIZE + self.payload.len());
        buffer.extend_from_slice(&header.to_bytes());
        buffer.extend_from_slice(&self.payload);
        Ok(buffer)
    }
}
