//! USB HID link backed by `hidapi`.

use hidapi::{HidApi, HidDevice};
use log::{debug, trace};
use shared::link::{LinkError, REPORT_SIZE};
use shared::{DeviceProfile, Link};

use crate::application::LinkProvider;
use crate::constants::READ_TIMEOUT_MS;
use crate::error::CliError;
use crate::transport::link_error;

/// Report ID prepended to every write; the devices use unnumbered reports.
const REPORT_ID: u8 = 0;

pub struct HidLink {
    device: HidDevice,
    timeout_ms: i32,
}

impl HidLink {
    /// Open the first device matching the profile's vendor, product and interface.
    pub fn open(profile: &DeviceProfile) -> Result<Self, CliError> {
        let api = HidApi::new().map_err(|err| CliError::Connect(err.to_string()))?;
        let info = api
            .device_list()
            .find(|info| {
                info.vendor_id() == profile.vendor_id
                    && info.product_id() == profile.product_id
                    && (info.interface_number() == profile.interface
                        || info.interface_number() == -1)
            })
            .ok_or_else(|| CliError::Connect(format!("no {} device connected", profile.name)))?;

        debug!("opening {}", info.path().to_string_lossy());
        let device = info
            .open_device(&api)
            .map_err(|err| CliError::Connect(err.to_string()))?;
        Ok(Self {
            device,
            timeout_ms: READ_TIMEOUT_MS,
        })
    }
}

impl Link for HidLink {
    fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<(), LinkError> {
        let mut buffer = [0u8; REPORT_SIZE + 1];
        buffer[0] = REPORT_ID;
        buffer[1..].copy_from_slice(report);
        let written = self
            .device
            .write(&buffer)
            .map_err(|err| link_error("hid write", err))?;
        trace!("wrote {written} byte report");
        Ok(())
    }

    fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> Result<usize, LinkError> {
        let read = self
            .device
            .read_timeout(report, self.timeout_ms)
            .map_err(|err| link_error("hid read", err))?;
        if read == 0 {
            return Err(LinkError::Timeout);
        }
        Ok(read)
    }
}

pub struct HidLinkProvider;

impl LinkProvider for HidLinkProvider {
    type Link = HidLink;

    fn connect(&self, profile: &DeviceProfile) -> Result<Self::Link, CliError> {
        HidLink::open(profile)
    }
}
