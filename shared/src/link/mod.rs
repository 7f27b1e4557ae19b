//! Contract with the physical report channel (USB HID on the devices we target).

use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

/// Size in bytes of one link report.
pub const REPORT_SIZE: usize = 64;

/// Payload bytes carried by one report after the channel marker.
pub const REPORT_PAYLOAD_SIZE: usize = REPORT_SIZE - 1;

/// Channel marker prefixed to every report on the HID links we know about (`?`).
pub const DEFAULT_CHANNEL_MARKER: u8 = 63;

/// Classified link failure.
///
/// Timeouts are the only class the session retries; the rest end the current call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Backend reported a protocol-level fault.
    #[error("link protocol error: {0}")]
    Protocol(String),
    /// Device endpoint was shut down or the pipe broke.
    #[error("link endpoint shut down: {0}")]
    Endpoint(String),
    /// Device is no longer attached.
    #[error("device disconnected: {0}")]
    Disconnected(String),
    /// Read returned no data in time; also the class of unrecognised errors.
    #[error("link read timed out")]
    Timeout,
}

impl LinkError {
    /// Classify a raw error reported by a link backend.
    ///
    /// Anything not recognised is treated as a timeout.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("protocol error") {
            LinkError::Protocol(message.to_owned())
        } else if lower.contains("endpoint shutdown") || lower.contains("broken pipe") {
            LinkError::Endpoint(message.to_owned())
        } else if lower.contains("no such device") || lower.contains("disconnected") {
            LinkError::Disconnected(message.to_owned())
        } else {
            LinkError::Timeout
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout)
    }
}

/// Bidirectional channel exchanging fixed-size reports with one device.
///
/// A link is owned by exactly one session; dropping it releases the device.
pub trait Link {
    /// Transmit one report.
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError>;

    /// Receive one report into `report`, returning the number of valid bytes.
    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError>;
}

impl<T> Link for &mut T
where
    T: Link + ?Sized,
{
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
        (**self).write_report(report)
    }

    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
        (**self).read_report(report)
    }
}

impl<T> Link for Box<T>
where
    T: Link + ?Sized,
{
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
        (**self).write_report(report)
    }

    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
        (**self).read_report(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_backend_messages() {
        assert!(matches!(
            LinkError::classify("libusb: protocol error"),
            LinkError::Protocol(_)
        ));
        assert!(matches!(
            LinkError::classify("cannot send after transport endpoint shutdown"),
            LinkError::Endpoint(_)
        ));
        assert!(matches!(
            LinkError::classify("no such device"),
            LinkError::Disconnected(_)
        ));
        assert_eq!(LinkError::classify("hid read failed"), LinkError::Timeout);
        assert!(LinkError::classify("").is_timeout());
    }
}
