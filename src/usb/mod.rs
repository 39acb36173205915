//! USB transport: device handling and raw transfer primitives.

mod device;
mod mock;
mod transport;

pub use device::UsbDevice;
pub use mock::MockBridge;
pub use transport::{EppTransport, TransportError};
