//! In-memory links for tests: a plain loopback and a scripted device simulator.

use std::collections::VecDeque;

use crate::frame::{ENVELOPE_HEADER_SIZE, Envelope, EnvelopeHeader, FrameCodec};
use crate::link::{DEFAULT_CHANNEL_MARKER, Link, LinkError, REPORT_SIZE};
use crate::schema::MessageType;

#[derive(Debug, Clone)]
enum Slot {
    Report([u8; REPORT_SIZE]),
    Error(LinkError),
}

/// Reports written are read back in order. An empty queue reads as a timeout.
#[derive(Debug, Default)]
pub struct LoopbackLink {
    queue: VecDeque<Slot>,
}

impl LoopbackLink {
    pub fn push_report(&mut self, report: [u8; REPORT_SIZE]) {
        self.queue.push_back(Slot::Report(report));
    }

    pub fn push_error(&mut self, error: LinkError) {
        self.queue.push_back(Slot::Error(error));
    }

    pub fn drop_last_report(&mut self) {
        self.queue.pop_back();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> Vec<[u8; REPORT_SIZE]> {
        self.queue
            .iter()
            .filter_map(|slot| match slot {
                Slot::Report(report) => Some(*report),
                Slot::Error(_) => None,
            })
            .collect()
    }
}

impl Link for LoopbackLink {
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
        self.push_report(*report);
        Ok(())
    }

    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
        match self.queue.pop_front() {
            Some(Slot::Report(queued)) => {
                *report = queued;
                Ok(REPORT_SIZE)
            }
            Some(Slot::Error(error)) => Err(error),
            None => Err(LinkError::Timeout),
        }
    }
}

/// One scripted device action in answer to a request.
#[derive(Debug, Clone)]
pub enum Reply {
    Envelope(Envelope),
    Timeout,
    Disconnect,
}

/// Behaviour of a simulated device.
pub trait DeviceModel {
    fn respond(&mut self, request: &Envelope) -> Vec<Reply>;
}

impl<F> DeviceModel for F
where
    F: FnMut(&Envelope) -> Vec<Reply>,
{
    fn respond(&mut self, request: &Envelope) -> Vec<Reply> {
        self(request)
    }
}

/// Replies handed out in order, one batch per request.
#[derive(Debug, Default)]
pub struct Script {
    batches: VecDeque<Vec<Reply>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, envelope: Envelope) -> Self {
        self.then(vec![Reply::Envelope(envelope)])
    }

    pub fn respond_after_timeouts(self, timeouts: usize, envelope: Envelope) -> Self {
        let mut batch = vec![Reply::Timeout; timeouts];
        batch.push(Reply::Envelope(envelope));
        self.then(batch)
    }

    pub fn then(mut self, batch: Vec<Reply>) -> Self {
        self.batches.push_back(batch);
        self
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl DeviceModel for Script {
    fn respond(&mut self, _request: &Envelope) -> Vec<Reply> {
        self.batches.pop_front().unwrap_or_default()
    }
}

/// Encode a prost record as a device reply.
pub fn reply<M: prost::Message>(message_type: MessageType, message: &M) -> Envelope {
    Envelope::new(message_type.code(), message.encode_to_vec())
}

/// Link that reassembles host envelopes, records them and answers through a [`DeviceModel`].
///
/// Reading with nothing queued reports a disconnect so a broken script fails fast.
pub struct SimulatedDevice<M> {
    model: M,
    marker: u8,
    inbound: Vec<u8>,
    outbound: LoopbackLink,
    requests: Vec<Envelope>,
}

impl<M> SimulatedDevice<M>
where
    M: DeviceModel,
{
    pub fn new(model: M) -> Self {
        Self {
            model,
            marker: DEFAULT_CHANNEL_MARKER,
            inbound: Vec::new(),
            outbound: LoopbackLink::default(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[Envelope] {
        &self.requests
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn complete_request(&mut self) -> Option<Envelope> {
        let header = EnvelopeHeader::from_bytes(&self.inbound)?;
        let total = ENVELOPE_HEADER_SIZE + header.length as usize;
        if self.inbound.len() < total {
            return None;
        }

        let payload = self.inbound[ENVELOPE_HEADER_SIZE..total].to_vec();
        self.inbound.clear();
        Some(Envelope::new(header.message_type, payload))
    }

    fn enqueue(&mut self, replies: Vec<Reply>) -> Result<(), LinkError> {
        for reply in replies {
            match reply {
                Reply::Envelope(envelope) => {
                    let mut codec = FrameCodec::with_marker(&mut self.outbound, self.marker);
                    codec
                        .write_envelope(&envelope)
                        .map_err(|err| LinkError::Protocol(err.to_string()))?;
                }
                Reply::Timeout => self.outbound.push_error(LinkError::Timeout),
                Reply::Disconnect => self
                    .outbound
                    .push_error(LinkError::Disconnected("simulated unplug".into())),
            }
        }
        Ok(())
    }
}

impl<M> Link for SimulatedDevice<M>
where
    M: DeviceModel,
{
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
        if report[0] != self.marker {
            return Err(LinkError::Protocol(format!(
                "unexpected channel marker {}",
                report[0]
            )));
        }
        self.inbound.extend_from_slice(&report[1..]);
        if self.inbound.len() >= 2 && self.inbound[..2] != crate::frame::ENVELOPE_MAGIC {
            self.inbound.clear();
            return Err(LinkError::Protocol("report does not start an envelope".into()));
        }

        if let Some(request) = self.complete_request() {
            let replies = self.model.respond(&request);
            self.requests.push(request);
            self.enqueue(replies)?;
        }
        Ok(())
    }

    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
        if self.outbound.is_empty() {
            return Err(LinkError::Disconnected("simulated device has nothing queued".into()));
        }
        self.outbound.read_report(report)
    }
}
