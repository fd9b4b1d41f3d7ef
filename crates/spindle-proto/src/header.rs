//! Fixed-size envelope header.

use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::{ProtocolError, Result};

/// Session-management operations carried by the envelope.
///
/// These cover the out-of-band handshake/teardown exchange; the data-plane
/// RPC traffic never touches this channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SmOpcode {
    /// Client asks the server endpoint to open a session.
    ConnectRequest = 1,
    /// Server accepts or rejects a session open.
    ConnectResponse = 2,
    /// Client asks the server endpoint to tear a session down.
    DisconnectRequest = 3,
    /// Server acknowledges a teardown.
    DisconnectResponse = 4,
}

impl SmOpcode {
    /// Decode an opcode byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ConnectRequest),
            2 => Some(Self::ConnectResponse),
            3 => Some(Self::DisconnectRequest),
            4 => Some(Self::DisconnectResponse),
            _ => None,
        }
    }

    /// Wire representation of this opcode.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// The fixed envelope prefix of every session-management datagram.
///
/// Layout (12 bytes, big-endian multi-byte fields):
///
/// ```text
/// 0        4        5        6        7        8            12
/// ┌────────┬────────┬────────┬────────┬────────┬─────────────┐
/// │ magic  │ version│ opcode │endpoint│reserved│ payload_len │
/// └────────┴────────┴────────┴────────┴────────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SmHeader {
    magic: U32<BigEndian>,
    version: u8,
    opcode: u8,
    endpoint_id: u8,
    reserved: u8,
    payload_len: U32<BigEndian>,
}

impl SmHeader {
    /// Size of the encoded header in bytes.
    pub const SIZE: usize = 12;

    /// Envelope magic, `"SPIN"` in ASCII.
    pub const MAGIC: u32 = 0x5350_494E;

    /// Current envelope version.
    pub const VERSION: u8 = 1;

    /// Build a header for an outgoing packet.
    pub fn new(opcode: SmOpcode, endpoint_id: u8, payload_len: u32) -> Self {
        Self {
            magic: U32::new(Self::MAGIC),
            version: Self::VERSION,
            opcode: opcode.to_u8(),
            endpoint_id,
            reserved: 0,
            payload_len: U32::new(payload_len),
        }
    }

    /// Parse a header from the front of `bytes`, returning it together with
    /// the remaining payload bytes.
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let (header, rest) = Self::read_from_prefix(bytes)
            .map_err(|_| ProtocolError::Truncated { len: bytes.len() })?;
        header.validate()?;
        Ok((header, rest))
    }

    fn validate(&self) -> Result<()> {
        if self.magic.get() != Self::MAGIC {
            return Err(ProtocolError::BadMagic(self.magic.get()));
        }
        if self.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }
        if SmOpcode::from_u8(self.opcode).is_none() {
            return Err(ProtocolError::UnknownOpcode(self.opcode));
        }
        Ok(())
    }

    /// Target endpoint id used by the hub to route this packet.
    pub fn endpoint_id(&self) -> u8 {
        self.endpoint_id
    }

    /// Decoded opcode. Valid by construction after [`SmHeader::parse`].
    pub fn opcode(&self) -> Option<SmOpcode> {
        SmOpcode::from_u8(self.opcode)
    }

    /// Declared payload length.
    pub fn payload_len(&self) -> u32 {
        self.payload_len.get()
    }

    /// Encoded bytes of this header.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}
