pub mod epp;
pub mod error;
pub mod payload;
pub mod usb;

pub use error::{AppError, Result};
