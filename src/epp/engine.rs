//! Register transaction sequencing.
//!
//! The bridge firmware's command dispatcher is stateless: every register
//! access is an independent USB conversation, so the full probe handshake
//! and finalization run before and after each transaction.

use tracing::debug;

use super::error::{EppError, Result, TransactionStep};
use super::protocol::{Direction, build_command, check_status};
use super::types::{
    ACK_OK, CAPABILITY_ACK, CAPABILITY_REQUEST, CMD_ENDPOINT, DATA_IN_ENDPOINT, DATA_OUT_ENDPOINT,
    FINALIZE_REQUEST, MAX_FIXED_FRAME, MODE_REQUEST, PROBE_INFO, PROBE_MODE, PROBE_READY,
    REQ_INFO, REQ_MODE, REQ_READY, STATUS_LEN,
};
use crate::usb::EppTransport;

/// Read `buf.len()` bytes from register `reg` into `buf`.
///
/// Runs one complete bridge transaction; the first failing transfer aborts
/// it with a step-identified error. On failure the buffer contents are
/// undefined and must not be treated as a short read.
pub fn read_register(transport: &mut impl EppTransport, reg: u8, buf: &mut [u8]) -> Result<()> {
    let count = transfer_count(buf.len())?;
    debug!("read transaction: reg={reg:#04x} count={count}");

    handshake(transport)?;
    dispatch(transport, Direction::Read, reg, count)?;

    let n = transport
        .bulk_read(DATA_IN_ENDPOINT, buf)
        .map_err(|source| EppError::Transfer {
            step: TransactionStep::Payload,
            source,
        })?;
    if n != buf.len() {
        return Err(EppError::PayloadTransferShort {
            expected: buf.len(),
            actual: n,
        });
    }

    confirm_status(transport, Direction::Read, count)?;
    finalize(transport)?;

    debug!("read transaction complete: {count} bytes from reg {reg:#04x}");
    Ok(())
}

/// Write `data` to register `reg`.
///
/// Success is confirmed by the bridge's status acknowledgement, not by
/// reading the register back.
pub fn write_register(transport: &mut impl EppTransport, reg: u8, data: &[u8]) -> Result<()> {
    let count = transfer_count(data.len())?;
    debug!("write transaction: reg={reg:#04x} count={count}");

    handshake(transport)?;
    dispatch(transport, Direction::Write, reg, count)?;

    let n = transport
        .bulk_write(DATA_OUT_ENDPOINT, data)
        .map_err(|source| EppError::Transfer {
            step: TransactionStep::Payload,
            source,
        })?;
    if n != data.len() {
        return Err(EppError::PayloadTransferShort {
            expected: data.len(),
            actual: n,
        });
    }

    confirm_status(transport, Direction::Write, count)?;
    finalize(transport)?;

    debug!("write transaction complete: {count} bytes to reg {reg:#04x}");
    Ok(())
}

/// The command frame carries the transfer length as a u32.
fn transfer_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EppError::TransferTooLarge { len })
}

/// Probe and capability sequence the bridge expects before it will accept
/// a command frame.
fn handshake(t: &mut impl EppTransport) -> Result<()> {
    expect_control(t, TransactionStep::Probe(1), REQ_READY, &PROBE_READY)?;
    expect_control(t, TransactionStep::Probe(2), REQ_MODE, &PROBE_MODE)?;
    expect_control(t, TransactionStep::Probe(3), REQ_INFO, &PROBE_INFO)?;
    expect_control(t, TransactionStep::Probe(4), REQ_READY, &PROBE_READY)?;

    send_frame(t, TransactionStep::CapabilityRequest, &CAPABILITY_REQUEST)?;
    if !read_reply(t, TransactionStep::CapabilityAck, &CAPABILITY_ACK)? {
        return Err(EppError::HandshakeMismatch {
            step: TransactionStep::CapabilityAck,
        });
    }

    expect_control(t, TransactionStep::Reprobe(1), REQ_READY, &PROBE_READY)?;
    expect_control(t, TransactionStep::Reprobe(2), REQ_MODE, &PROBE_MODE)?;
    expect_control(t, TransactionStep::Reprobe(3), REQ_INFO, &PROBE_INFO)?;
    expect_control(t, TransactionStep::Reprobe(4), REQ_INFO, &PROBE_INFO)?;

    send_frame(t, TransactionStep::ModeRequest, &MODE_REQUEST)?;
    if !read_reply(t, TransactionStep::ModeAck, &ACK_OK)? {
        return Err(EppError::HandshakeMismatch {
            step: TransactionStep::ModeAck,
        });
    }

    debug!("handshake complete");
    Ok(())
}

/// Send the command frame naming direction, register and count.
fn dispatch(t: &mut impl EppTransport, dir: Direction, reg: u8, count: u32) -> Result<()> {
    let command = build_command(dir, reg, count);
    send_frame(t, TransactionStep::Command, &command)?;
    if !read_reply(t, TransactionStep::CommandAck, &ACK_OK)? {
        return Err(EppError::CommandAckFailure);
    }
    Ok(())
}

/// Poll the direction-specific status and check it against the command.
fn confirm_status(t: &mut impl EppTransport, dir: Direction, count: u32) -> Result<()> {
    send_frame(t, TransactionStep::StatusPoll, dir.status_poll())?;

    let mut frame = [0u8; STATUS_LEN];
    let n = t
        .bulk_read(CMD_ENDPOINT, &mut frame)
        .map_err(|source| EppError::Transfer {
            step: TransactionStep::Status,
            source,
        })?;
    if n != STATUS_LEN {
        return Err(EppError::StatusFrameShort { actual: n });
    }
    check_status(&frame, dir, count)
}

/// Close the transaction; the bridge acknowledges with the generic ack.
fn finalize(t: &mut impl EppTransport) -> Result<()> {
    send_frame(t, TransactionStep::FinalizeRequest, &FINALIZE_REQUEST)?;
    if !read_reply(t, TransactionStep::FinalizeAck, &ACK_OK)? {
        return Err(EppError::FinalizeAckFailure);
    }
    Ok(())
}

/// Issue a vendor control read and require the bridge's fixed response.
fn expect_control(
    t: &mut impl EppTransport,
    step: TransactionStep,
    request: u8,
    expected: &[u8],
) -> Result<()> {
    let mut buf = [0u8; MAX_FIXED_FRAME];
    let buf = &mut buf[..expected.len()];
    let n = t
        .control_read(request, 0x0000, 0x0000, buf)
        .map_err(|source| EppError::Transfer { step, source })?;
    if buf[..n] != *expected {
        return Err(EppError::HandshakeMismatch { step });
    }
    Ok(())
}

/// Send a fixed frame on the command endpoint, requiring a complete write.
fn send_frame(t: &mut impl EppTransport, step: TransactionStep, frame: &[u8]) -> Result<()> {
    let n = t
        .bulk_write(CMD_ENDPOINT, frame)
        .map_err(|source| EppError::Transfer { step, source })?;
    if n != frame.len() {
        return Err(EppError::HandshakeMismatch { step });
    }
    Ok(())
}

/// Read a reply from the command endpoint; `true` if it matches exactly.
fn read_reply(t: &mut impl EppTransport, step: TransactionStep, expected: &[u8]) -> Result<bool> {
    let mut buf = [0u8; MAX_FIXED_FRAME];
    let buf = &mut buf[..expected.len()];
    let n = t
        .bulk_read(CMD_ENDPOINT, buf)
        .map_err(|source| EppError::Transfer { step, source })?;
    Ok(buf[..n] == *expected)
}
