use log::{debug, trace};

use crate::frame::{ENVELOPE_HEADER_SIZE, Envelope, EnvelopeHeader, FrameError};
use crate::link::{DEFAULT_CHANNEL_MARKER, Link, LinkError, REPORT_PAYLOAD_SIZE, REPORT_SIZE};

/// Upper bound on the buffer reserved up front for an incoming payload.
const MAX_PREALLOCATION: usize = 64 * 1024;

/// Splits envelopes into link reports and reassembles multi-report responses.
pub struct FrameCodec<L> {
    link: L,
    marker: u8,
    max_payload: Option<usize>,
}

impl<L> FrameCodec<L>
where
    L: Link,
{
    pub fn new(link: L) -> Self {
        Self::with_marker(link, DEFAULT_CHANNEL_MARKER)
    }

    pub fn with_marker(link: L, marker: u8) -> Self {
        Self {
            link,
            marker,
            max_payload: None,
        }
    }

    /// Reject responses whose header declares more than `limit` payload bytes.
    pub fn with_max_payload(mut self, limit: usize) -> Self {
        self.max_payload = Some(limit);
        self
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Send a logical buffer as `ceil(len / 63)` zero-padded reports.
    ///
    /// Returns the number of reports written.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        let mut reports = 0;
        for chunk in bytes.chunks(REPORT_PAYLOAD_SIZE) {
            let mut report = [0u8; REPORT_SIZE];
            report[0] = self.marker;
            report[1..=chunk.len()].copy_from_slice(chunk);
            self.link.write_report(&report)?;
            reports += 1;
        }
        trace!("wrote {} bytes in {reports} reports", bytes.len());
        Ok(reports)
    }

    pub fn write_envelope(&mut self, envelope: &Envelope) -> Result<usize, FrameError> {
        let bytes = envelope.encode()?;
        Ok(self.write(&bytes)?)
    }

    /// Read one envelope.
    ///
    /// The first report is scanned for the magic marker after its channel byte. A report
    /// without one surfaces the link's error, or [`LinkError::Timeout`] when the link returned
    /// data without a header.
    pub fn read(&mut self) -> Result<Envelope, FrameError> {
        let mut report = [0u8; REPORT_SIZE];
        let received = self.link.read_report(&mut report)?.min(REPORT_SIZE);

        let Some(start) = find_header(&report[..received]) else {
            trace!("discarding {received} byte report without envelope header");
            return Err(FrameError::Link(LinkError::Timeout));
        };
        let Some(header) = EnvelopeHeader::from_bytes(&report[start..received]) else {
            return Err(FrameError::Link(LinkError::Timeout));
        };

        let declared = header.length as usize;
        if let Some(limit) = self.max_payload.filter(|limit| declared > *limit) {
            debug!("rejecting envelope declaring {declared} bytes");
            return Err(FrameError::PayloadTooLarge {
                actual: declared,
                limit,
            });
        }
        let body = &report[start + ENVELOPE_HEADER_SIZE..received];
        if body.len() >= declared {
            return Ok(Envelope::new(header.message_type, body[..declared].to_vec()));
        }

        let mut payload = Vec::with_capacity(declared.min(MAX_PREALLOCATION));
        payload.extend_from_slice(body);

        while payload.len() < declared {
            let count = match self.link.read_report(&mut report) {
                Ok(count) => count.min(REPORT_SIZE),
                Err(source) => {
                    debug!(
                        "continuation read failed after {} of {declared} bytes",
                        payload.len()
                    );
                    return Err(FrameError::Truncated {
                        declared,
                        received: payload.len(),
                        source,
                    });
                }
            };
            if count <= 1 {
                continue;
            }
            let take = (count - 1).min(declared - payload.len());
            payload.extend_from_slice(&report[1..=take]);
        }

        Ok(Envelope::new(header.message_type, payload))
    }
}

/// Offset of the first header in a report, never counting the channel byte.
fn find_header(report: &[u8]) -> Option<usize> {
    report
        .get(1..)?
        .windows(ENVELOPE_HEADER_SIZE)
        .position(|window| EnvelopeHeader::from_bytes(window).is_some())
        .map(|position| position + 1)
}
