//! EPP transaction error types.

use std::fmt;

use thiserror::Error;

use crate::usb::TransportError;

/// Individual transfers making up one register transaction, in protocol
/// order. The failing step is the only diagnostic the bridge offers, so
/// every error that can be tied to a transfer carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStep {
    /// Control-read probe ahead of the capability exchange (1-based).
    Probe(u8),
    /// Capability request write on the command endpoint.
    CapabilityRequest,
    /// Capability acknowledgement read.
    CapabilityAck,
    /// Control-read probe repeated after the capability exchange (1-based).
    Reprobe(u8),
    /// Mode-set request write.
    ModeRequest,
    /// Mode-set acknowledgement read.
    ModeAck,
    /// Command frame write.
    Command,
    /// Command acknowledgement read.
    CommandAck,
    /// Payload transfer on the data endpoint.
    Payload,
    /// Status poll write.
    StatusPoll,
    /// Status frame read.
    Status,
    /// Finalize request write.
    FinalizeRequest,
    /// Finalize acknowledgement read.
    FinalizeAck,
}

impl fmt::Display for TransactionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStep::Probe(n) => write!(f, "probe {n}"),
            TransactionStep::CapabilityRequest => write!(f, "capability request"),
            TransactionStep::CapabilityAck => write!(f, "capability ack"),
            TransactionStep::Reprobe(n) => write!(f, "re-probe {n}"),
            TransactionStep::ModeRequest => write!(f, "mode request"),
            TransactionStep::ModeAck => write!(f, "mode ack"),
            TransactionStep::Command => write!(f, "command dispatch"),
            TransactionStep::CommandAck => write!(f, "command ack"),
            TransactionStep::Payload => write!(f, "payload transfer"),
            TransactionStep::StatusPoll => write!(f, "status poll"),
            TransactionStep::Status => write!(f, "status frame"),
            TransactionStep::FinalizeRequest => write!(f, "finalize request"),
            TransactionStep::FinalizeAck => write!(f, "finalize ack"),
        }
    }
}

/// Errors that abort a register transaction.
///
/// The protocol is fail-fast with no retries: the first failing transfer
/// terminates the transaction, and the device handle stays valid for a
/// fresh attempt. A failed read leaves the caller's buffer undefined.
#[derive(Error, Debug)]
pub enum EppError {
    /// The USB operation itself failed at the named step.
    #[error("USB transfer failed at {step}: {source}")]
    Transfer {
        step: TransactionStep,
        #[source]
        source: TransportError,
    },

    /// A fixed handshake exchange moved the wrong number of bytes or
    /// returned unexpected content.
    #[error("handshake mismatch at {step}")]
    HandshakeMismatch { step: TransactionStep },

    /// The command frame was not acknowledged.
    #[error("command frame was not acknowledged")]
    CommandAckFailure,

    /// The payload transfer moved the wrong number of bytes.
    #[error("payload transfer moved {actual} of {expected} bytes")]
    PayloadTransferShort { expected: usize, actual: usize },

    /// The status frame arrived with the wrong length.
    #[error("status frame arrived with {actual} bytes")]
    StatusFrameShort { actual: usize },

    /// The status frame disagreed with the dispatched command.
    #[error(
        "status frame {frame:02x?} does not acknowledge {expected_ack:#04x} \
         with count {expected_count:02x?}"
    )]
    StatusMismatch {
        expected_ack: u8,
        expected_count: [u8; 4],
        frame: [u8; 6],
    },

    /// The finalize request was not acknowledged.
    #[error("finalize was not acknowledged")]
    FinalizeAckFailure,

    /// The requested transfer does not fit the command frame's 32-bit
    /// count field.
    #[error("transfer of {len} bytes exceeds the 32-bit count field")]
    TransferTooLarge { len: usize },
}

/// Result type for register transactions.
pub type Result<T> = std::result::Result<T, EppError>;
