// crates/lazulite/src/segment.rs
//! Segment structure and wire codec.
//!
//! Every segment is a 24-byte little-endian header followed by `len` payload
//! bytes; several segments are packed back-to-back inside one datagram.

use crate::consts::OVERHEAD;
use crate::error::{Result, SessionError};
use bytes::BytesMut;
use lazulite_binary::{BinaryReader, BinaryWriter};

/// Segment command, carried in the `cmd` header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Data push.
    Push = 81,
    /// Acknowledgement of one received sequence number.
    Ack = 82,
    /// Window probe: ask the remote to advertise its receive window.
    WindowAsk = 83,
    /// Window advertisement sent in answer to a probe.
    WindowTell = 84,
}

impl Command {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            81 => Some(Command::Push),
            82 => Some(Command::Ack),
            83 => Some(Command::WindowAsk),
            84 => Some(Command::WindowTell),
            _ => None,
        }
    }
}

/// One unit of wire transfer, together with the send-side retransmission
/// bookkeeping that never leaves the host.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Conversation id; both endpoints must agree on it out of band.
    pub conv: u32,
    pub cmd: Command,
    /// Remaining-fragments counter; 0 marks the last fragment of a message.
    pub frg: u8,
    /// Free receive window of the sender at transmission time.
    pub wnd: u16,
    /// Send timestamp, echoed back in the matching ACK.
    pub ts: u32,
    /// Sequence number.
    pub sn: u32,
    /// Smallest sequence number the sender has not yet acknowledged.
    pub una: u32,
    /// Payload; empty for ACK and window-probe segments.
    pub data: BytesMut,

    /// Timestamp at which this segment becomes due for retransmission.
    pub resendts: u32,
    /// Per-segment retransmission timeout.
    pub rto: u32,
    /// How many later-numbered segments have been acknowledged past this one.
    pub fastack: u32,
    /// Transmission count.
    pub xmit: u32,
}

impl Segment {
    pub fn new(cmd: Command) -> Self {
        Self::with_data(cmd, BytesMut::new())
    }

    pub fn with_data(cmd: Command, data: BytesMut) -> Self {
        Segment {
            conv: 0,
            cmd,
            frg: 0,
            wnd: 0,
            ts: 0,
            sn: 0,
            una: 0,
            data,
            resendts: 0,
            rto: 0,
            fastack: 0,
            xmit: 0,
        }
    }

    /// Bytes this segment occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        OVERHEAD + self.data.len()
    }

    /// Appends the header and payload to `writer`.
    pub fn encode(&self, writer: &mut impl BinaryWriter) -> Result<()> {
        writer.write_u32_le(self.conv)?;
        writer.write_u8(self.cmd as u8)?;
        writer.write_u8(self.frg)?;
        writer.write_u16_le(self.wnd)?;
        writer.write_u32_le(self.ts)?;
        writer.write_u32_le(self.sn)?;
        writer.write_u32_le(self.una)?;
        writer.write_u32_le(self.data.len() as u32)?;
        writer.write_bytes(&self.data)?;
        Ok(())
    }

    /// Decodes one segment off the front of `reader`.
    ///
    /// Retransmission bookkeeping comes back zeroed; it is meaningless off
    /// the sending host.
    pub fn decode(reader: &mut impl BinaryReader) -> Result<Self> {
        let conv = reader.read_u32_le()?;
        let cmd_byte = reader.read_u8()?;
        let frg = reader.read_u8()?;
        let wnd = reader.read_u16_le()?;
        let ts = reader.read_u32_le()?;
        let sn = reader.read_u32_le()?;
        let una = reader.read_u32_le()?;
        let len = reader.read_u32_le()? as usize;

        if reader.remaining() < len {
            return Err(SessionError::PayloadTruncated {
                declared: len,
                remaining: reader.remaining(),
            });
        }
        let cmd = Command::from_u8(cmd_byte).ok_or(SessionError::UnknownCommand(cmd_byte))?;
        let payload = reader.read_bytes(len)?;

        let mut segment = Segment::with_data(cmd, BytesMut::from(payload.as_ref()));
        segment.conv = conv;
        segment.frg = frg;
        segment.wnd = wnd;
        segment.ts = ts;
        segment.sn = sn;
        segment.una = una;
        Ok(segment)
    }
}

/// Reads the conversation id off the first four bytes of a datagram, for
/// demultiplexing before any session exists. Returns `None` on a runt.
pub fn peek_conv(data: &[u8]) -> Option<u32> {
    let mut buf = data;
    buf.read_u32_le().ok()
}
