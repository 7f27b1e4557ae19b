//! One request/response exchange at a time over an exclusively owned link.

use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::device::DeviceProfile;
use crate::error::SharedError;
use crate::frame::{Envelope, FrameCodec, FrameError};
use crate::link::Link;
use crate::schema::{Message, MessageType, Request, SchemaTable};

/// Decoded response together with its envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub type_code: u16,
    pub declared_length: usize,
    pub elapsed: Duration,
    pub message: Message,
}

impl Response {
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_code(self.type_code)
    }
}

pub struct Session<L> {
    codec: FrameCodec<L>,
    profile: DeviceProfile,
    schema: &'static SchemaTable,
}

impl<L> Session<L>
where
    L: Link,
{
    pub fn new(link: L, profile: DeviceProfile) -> Self {
        let mut codec = FrameCodec::with_marker(link, profile.channel_marker);
        if let Some(limit) = profile.max_payload {
            codec = codec.with_max_payload(limit);
        }
        let schema = profile.schema();
        Self {
            codec,
            profile,
            schema,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn schema(&self) -> &'static SchemaTable {
        self.schema
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.codec.link_mut()
    }

    pub fn into_link(self) -> L {
        self.codec.into_link()
    }

    /// Send a pre-encoded payload under an arbitrary type code.
    pub fn send_raw(&mut self, type_code: u16, payload: Vec<u8>) -> Result<usize, SharedError> {
        let envelope = Envelope::new(type_code, payload);
        debug!(
            "sending type {type_code} with {} payload bytes",
            envelope.declared_length()
        );
        Ok(self.codec.write_envelope(&envelope)?)
    }

    pub fn send(&mut self, request: &Request) -> Result<usize, SharedError> {
        let envelope = self.schema.encode(request)?;
        debug!(
            "sending {:?} with {} payload bytes",
            request.message_type(),
            envelope.declared_length()
        );
        Ok(self.codec.write_envelope(&envelope)?)
    }

    /// Read exactly one envelope, re-reading while the link times out.
    pub fn read(&mut self) -> Result<Response, SharedError> {
        let started = Instant::now();
        self.read_since(started)
    }

    pub fn call(&mut self, request: &Request) -> Result<Response, SharedError> {
        let started = Instant::now();
        self.send(request)?;
        self.read_since(started)
    }

    fn read_since(&mut self, started: Instant) -> Result<Response, SharedError> {
        let envelope = loop {
            match self.codec.read() {
                Ok(envelope) => break envelope,
                Err(FrameError::Link(err)) if err.is_timeout() => {
                    trace!("read timed out, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        };

        let message = self.schema.decode(envelope.message_type, &envelope.payload);
        debug!(
            "received type {} with {} payload bytes",
            envelope.message_type,
            envelope.declared_length()
        );

        Ok(Response {
            type_code: envelope.message_type,
            declared_length: envelope.declared_length(),
            elapsed: started.elapsed(),
            message,
        })
    }
}
