//! EPP bridge protocol constants.
//!
//! The bridge firmware answers every transaction with the same fixed
//! conversation; the frames below are the exact bytes it sends and expects,
//! as observed on the wire.

// Control request codes answered during the probe sequence
pub(crate) const REQ_READY: u8 = 0xE9;
pub(crate) const REQ_MODE: u8 = 0xE6;
pub(crate) const REQ_INFO: u8 = 0xE7;

// Fixed probe responses
pub(crate) const PROBE_READY: [u8; 4] = [0x05, 0x00, 0x10, 0x00];
pub(crate) const PROBE_MODE: [u8; 2] = [0x03, 0x03];
pub(crate) const PROBE_INFO: [u8; 8] = [0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

// Capability exchange on the command endpoint
pub(crate) const CAPABILITY_REQUEST: [u8; 8] = [0x07, 0x00, 0x03, 0x00, 0x71, 0x7F, 0x12, 0x01];
pub(crate) const CAPABILITY_ACK: [u8; 6] = [0x05, 0x00, 0x09, 0x81, 0xED, 0xFE];

// Mode set, status polls and finalize share the 03 04 lead-in; byte 2
// selects the operation
pub(crate) const MODE_REQUEST: [u8; 4] = [0x03, 0x04, 0x00, 0x00];
pub(crate) const READ_STATUS_POLL: [u8; 4] = [0x03, 0x04, 0x85, 0x00];
pub(crate) const WRITE_STATUS_POLL: [u8; 4] = [0x03, 0x04, 0x84, 0x00];
pub(crate) const FINALIZE_REQUEST: [u8; 4] = [0x03, 0x04, 0x01, 0x00];

/// Acknowledgement shared by the mode-set, command and finalize exchanges.
pub(crate) const ACK_OK: [u8; 2] = [0x01, 0x00];

// Command and status frame layout
pub(crate) const COMMAND_HEADER: [u8; 2] = [0x08, 0x04];
pub(crate) const COMMAND_LEN: usize = 9;
pub(crate) const STATUS_HEADER: u8 = 0x05;
pub(crate) const STATUS_LEN: usize = 6;

/// Largest fixed frame exchanged during the handshake.
pub(crate) const MAX_FIXED_FRAME: usize = 8;

// Endpoints: commands and their replies move over endpoint 1, payload data
// over endpoint 6 (reads) and endpoint 2 (writes)
pub(crate) const CMD_ENDPOINT: u8 = 1;
pub(crate) const DATA_IN_ENDPOINT: u8 = 6;
pub(crate) const DATA_OUT_ENDPOINT: u8 = 2;
