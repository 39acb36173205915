//! USB transport abstraction.
//!
//! The transaction engine drives the bridge through these three primitives;
//! the real device and the in-memory bridge emulator both implement them.

use thiserror::Error;

/// Errors raised by a transport implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No device with the requested IDs is attached.
    #[error("device not found: VID={vid:04x} PID={pid:04x}")]
    DeviceNotFound { vid: u16, pid: u16 },

    /// The device was found but its interface could not be claimed.
    #[error("failed to claim interface {interface}: {source}")]
    ClaimInterface {
        interface: u8,
        #[source]
        source: rusb::Error,
    },

    /// A USB operation failed.
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// Transport-specific read failure.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Transport-specific write failure.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Blocking USB primitives for one bridge conversation.
///
/// Implementations own endpoint direction bits and timeout enforcement;
/// callers own length and content verdicts. Every method blocks the calling
/// thread until the transfer completes or times out, so a handle must not
/// be shared across threads without external serialization.
pub trait EppTransport {
    /// Vendor IN control transfer; returns the number of bytes received.
    fn control_read(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError>;

    /// Bulk OUT transfer; returns the number of bytes sent.
    fn bulk_write(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, TransportError>;

    /// Bulk IN transfer; returns the number of bytes received.
    fn bulk_read(&mut self, endpoint: u8, buf: &mut [u8]) -> Result<usize, TransportError>;
}
