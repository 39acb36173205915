//! In-memory bridge emulator.
//!
//! Implements [`EppTransport`] without hardware: answers the probe sequence,
//! parses command frames, stores and echoes register payloads, and builds
//! status frames from the last dispatched command. Fault-injection knobs
//! corrupt or truncate individual transfers so that step attribution can be
//! tested exactly.

use std::collections::{HashMap, VecDeque};

use super::transport::{EppTransport, TransportError};
use crate::epp::types::{
    ACK_OK, CAPABILITY_ACK, CAPABILITY_REQUEST, CMD_ENDPOINT, COMMAND_HEADER, COMMAND_LEN,
    DATA_IN_ENDPOINT, DATA_OUT_ENDPOINT, FINALIZE_REQUEST, MODE_REQUEST, PROBE_INFO, PROBE_MODE,
    PROBE_READY, READ_STATUS_POLL, REQ_INFO, REQ_MODE, REQ_READY, STATUS_HEADER,
    WRITE_STATUS_POLL,
};

/// Last command frame the emulator accepted.
#[derive(Debug, Clone, Copy)]
struct Command {
    reg: u8,
    count: u32,
}

/// Scripted stand-in for the bridge firmware.
#[derive(Debug, Default)]
pub struct MockBridge {
    registers: HashMap<u8, Vec<u8>>,
    command: Option<Command>,
    replies: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    served: usize,
    written: usize,
    corrupt_reply: Option<usize>,
    truncate_reply: Option<usize>,
    short_write: Option<usize>,
    status_ack_override: Option<u8>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a register with data to serve on reads.
    pub fn preload(&mut self, reg: u8, data: &[u8]) {
        self.registers.insert(reg, data.to_vec());
    }

    /// Stored contents of a register.
    pub fn register(&self, reg: u8) -> Option<&[u8]> {
        self.registers.get(&reg).map(Vec::as_slice)
    }

    /// Frames written to the command endpoint so far, in order.
    pub fn sent_frames(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Flip the low bit of the last byte of the `n`th inbound transfer
    /// (0-based, counting control reads and bulk reads together).
    pub fn corrupt_reply(&mut self, n: usize) {
        self.corrupt_reply = Some(n);
    }

    /// Serve the `n`th inbound transfer one byte short.
    pub fn truncate_reply(&mut self, n: usize) {
        self.truncate_reply = Some(n);
    }

    /// Report the `n`th outbound transfer (0-based) one byte short.
    pub fn short_write(&mut self, n: usize) {
        self.short_write = Some(n);
    }

    /// Answer status polls with `ack` regardless of the polled direction.
    pub fn force_status_ack(&mut self, ack: u8) {
        self.status_ack_override = Some(ack);
    }

    fn serve(&mut self, reply: &[u8], buf: &mut [u8]) -> usize {
        let idx = self.served;
        self.served += 1;

        let mut len = reply.len().min(buf.len());
        if self.truncate_reply == Some(idx) {
            len = len.saturating_sub(1);
        }
        buf[..len].copy_from_slice(&reply[..len]);
        if self.corrupt_reply == Some(idx) && len > 0 {
            buf[len - 1] ^= 0x01;
        }
        len
    }

    fn accept(&mut self, len: usize) -> usize {
        let idx = self.written;
        self.written += 1;
        if self.short_write == Some(idx) {
            len.saturating_sub(1)
        } else {
            len
        }
    }

    fn build_status(&self, ack: u8) -> Result<Vec<u8>, TransportError> {
        let command = self
            .command
            .ok_or_else(|| TransportError::ReadFailed("status poll without a command".into()))?;
        let ack = self.status_ack_override.unwrap_or(ack);
        let mut frame = vec![STATUS_HEADER, ack];
        frame.extend_from_slice(&command.count.to_le_bytes());
        Ok(frame)
    }
}

impl EppTransport for MockBridge {
    fn control_read(
        &mut self,
        request: u8,
        _value: u16,
        _index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        let reply: Vec<u8> = match request {
            REQ_READY => PROBE_READY.to_vec(),
            REQ_MODE => PROBE_MODE.to_vec(),
            REQ_INFO => PROBE_INFO.to_vec(),
            _ => {
                return Err(TransportError::ReadFailed(format!(
                    "unknown control request {request:#04x}"
                )));
            }
        };
        Ok(self.serve(&reply, buf))
    }

    fn bulk_write(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, TransportError> {
        match endpoint {
            CMD_ENDPOINT => {
                self.sent.push(data.to_vec());
                if data == CAPABILITY_REQUEST {
                    self.replies.push_back(CAPABILITY_ACK.to_vec());
                } else if data == MODE_REQUEST || data == FINALIZE_REQUEST {
                    self.replies.push_back(ACK_OK.to_vec());
                } else if data == READ_STATUS_POLL {
                    let frame = self.build_status(0x40)?;
                    self.replies.push_back(frame);
                } else if data == WRITE_STATUS_POLL {
                    let frame = self.build_status(0x80)?;
                    self.replies.push_back(frame);
                } else if data.len() == COMMAND_LEN && data[0..2] == COMMAND_HEADER {
                    self.command = Some(Command {
                        reg: data[4],
                        count: u32::from_le_bytes([data[5], data[6], data[7], data[8]]),
                    });
                    self.replies.push_back(ACK_OK.to_vec());
                } else {
                    return Err(TransportError::WriteFailed(format!(
                        "unrecognized frame {data:02x?}"
                    )));
                }
                Ok(self.accept(data.len()))
            }
            DATA_OUT_ENDPOINT => {
                let command = self.command.ok_or_else(|| {
                    TransportError::WriteFailed("payload write without a command".into())
                })?;
                self.registers.insert(command.reg, data.to_vec());
                Ok(self.accept(data.len()))
            }
            _ => Err(TransportError::WriteFailed(format!(
                "unexpected OUT endpoint {endpoint}"
            ))),
        }
    }

    fn bulk_read(&mut self, endpoint: u8, buf: &mut [u8]) -> Result<usize, TransportError> {
        match endpoint {
            CMD_ENDPOINT => {
                let reply = self
                    .replies
                    .pop_front()
                    .ok_or_else(|| TransportError::ReadFailed("no reply queued".into()))?;
                Ok(self.serve(&reply, buf))
            }
            DATA_IN_ENDPOINT => {
                let command = self.command.ok_or_else(|| {
                    TransportError::ReadFailed("payload read without a command".into())
                })?;
                let mut data = self.registers.get(&command.reg).cloned().unwrap_or_default();
                data.resize(command.count as usize, 0);
                Ok(self.serve(&data, buf))
            }
            _ => Err(TransportError::ReadFailed(format!(
                "unexpected IN endpoint {endpoint}"
            ))),
        }
    }
}
