//! Complete session-management packet: envelope plus opaque payload.

use bytes::Bytes;

use crate::errors::{ProtocolError, Result};
use crate::header::{SmHeader, SmOpcode};

/// A decoded session-management packet.
///
/// The hub routes on [`SmPacket::endpoint_id`] alone; the payload is owned by
/// the session-management layer and carried here as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmPacket {
    opcode: SmOpcode,
    endpoint_id: u8,
    payload: Bytes,
}

impl SmPacket {
    /// Maximum payload size. Session-management packets are small; anything
    /// larger is malformed.
    pub const MAX_PAYLOAD: usize = 1024;

    /// Maximum encoded datagram size.
    pub const MAX_DATAGRAM: usize = SmHeader::SIZE + Self::MAX_PAYLOAD;

    /// Build a packet addressed to `endpoint_id`.
    pub fn new(opcode: SmOpcode, endpoint_id: u8, payload: Bytes) -> Result<Self> {
        if payload.len() > Self::MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge { len: payload.len() });
        }
        Ok(Self { opcode, endpoint_id, payload })
    }

    /// Decode one datagram.
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        let (header, rest) = SmHeader::parse(datagram)?;

        let declared = header.payload_len() as usize;
        if declared > Self::MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge { len: declared });
        }
        if declared != rest.len() {
            return Err(ProtocolError::LengthMismatch { declared, actual: rest.len() });
        }

        // Opcode validity is checked by SmHeader::parse; the unwrap_or
        // branch is unreachable but keeps this panic-free.
        let opcode = header.opcode().unwrap_or(SmOpcode::ConnectRequest);
        Ok(Self { opcode, endpoint_id: header.endpoint_id(), payload: Bytes::copy_from_slice(rest) })
    }

    /// Encode into a fresh datagram buffer.
    pub fn encode(&self) -> Vec<u8> {
        let header = SmHeader::new(self.opcode, self.endpoint_id, self.payload.len() as u32);
        let mut out = Vec::with_capacity(SmHeader::SIZE + self.payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Session-management operation this packet carries.
    pub fn opcode(&self) -> SmOpcode {
        self.opcode
    }

    /// Endpoint id the packet is addressed to.
    pub fn endpoint_id(&self) -> u8 {
        self.endpoint_id
    }

    /// Opaque payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}
