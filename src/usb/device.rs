//! rusb-backed transport for the Nexys2 bridge.

use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext};
use tracing::{debug, info, warn};

use super::transport::{EppTransport, TransportError};

/// Every bridge transfer uses the same fixed timeout.
const TRANSFER_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration and interface the bridge firmware enumerates.
const CONFIGURATION: u8 = 1;
const INTERFACE: u8 = 0;

/// An opened, interface-claimed Nexys2 bridge.
///
/// The interface is released when the handle is dropped.
pub struct UsbDevice {
    handle: DeviceHandle<GlobalContext>,
}

impl UsbDevice {
    /// Open the first device matching `vid:pid` and claim the bridge
    /// interface.
    pub fn open(vid: u16, pid: u16) -> Result<Self, TransportError> {
        info!("opening USB device {vid:04x}:{pid:04x}");

        let mut handle = rusb::open_device_with_vid_pid(vid, pid)
            .ok_or(TransportError::DeviceNotFound { vid, pid })?;

        if handle.active_configuration()? != CONFIGURATION {
            handle.set_active_configuration(CONFIGURATION)?;
        }
        handle
            .claim_interface(INTERFACE)
            .map_err(|source| TransportError::ClaimInterface {
                interface: INTERFACE,
                source,
            })?;

        debug!("configuration {CONFIGURATION} active, interface {INTERFACE} claimed");
        Ok(Self { handle })
    }
}

impl EppTransport for UsbDevice {
    fn control_read(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        let request_type = rusb::request_type(
            rusb::Direction::In,
            rusb::RequestType::Vendor,
            rusb::Recipient::Device,
        );
        let n = self
            .handle
            .read_control(request_type, request, value, index, buf, TRANSFER_TIMEOUT)?;
        Ok(n)
    }

    fn bulk_write(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, TransportError> {
        let n = self.handle.write_bulk(endpoint, data, TRANSFER_TIMEOUT)?;
        Ok(n)
    }

    fn bulk_read(&mut self, endpoint: u8, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = self
            .handle
            .read_bulk(endpoint | rusb::constants::LIBUSB_ENDPOINT_IN, buf, TRANSFER_TIMEOUT)?;
        Ok(n)
    }
}

impl Drop for UsbDevice {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(INTERFACE) {
            warn!("failed to release interface {INTERFACE}: {e}");
        }
    }
}
