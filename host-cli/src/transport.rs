use std::fmt::Display;

use shared::LinkError;

#[cfg(feature = "hid")]
pub mod hid;

#[cfg(not(feature = "hid"))]
pub use unavailable::UnavailableLinkProvider;

/// Map a backend error onto the link taxonomy the session understands.
pub fn link_error(context: &str, err: impl Display) -> LinkError {
    LinkError::classify(&format!("{context}: {err}"))
}

#[cfg(not(feature = "hid"))]
mod unavailable {
    use shared::link::REPORT_SIZE;
    use shared::{DeviceProfile, Link, LinkError};

    use crate::application::LinkProvider;
    use crate::error::CliError;

    /// Link that can never be opened.
    pub enum NoLink {}

    impl Link for NoLink {
        fn write_report(&mut self, _report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
            match *self {}
        }

        fn read_report(&mut self, _report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
            match *self {}
        }
    }

    /// Provider used when the binary is built without USB HID support.
    pub struct UnavailableLinkProvider;

    impl LinkProvider for UnavailableLinkProvider {
        type Link = NoLink;

        fn connect(&self, profile: &DeviceProfile) -> Result<Self::Link, CliError> {
            Err(CliError::Connect(format!(
                "cannot reach {}: built without the `hid` feature",
                profile.name
            )))
        }
    }
}
