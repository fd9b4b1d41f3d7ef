//! Error types for envelope parsing.

use thiserror::Error;

use crate::header::SmHeader;
use crate::packet::SmPacket;

/// Result type alias for envelope operations.
pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Errors produced while decoding a session-management datagram.
///
/// The hub absorbs all of these silently (with a log line); a malformed
/// datagram is treated the same as a lost one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Datagram is shorter than the fixed envelope.
    #[error("datagram of {len} bytes is shorter than the {} byte envelope", SmHeader::SIZE)]
    Truncated {
        /// Length of the received datagram.
        len: usize,
    },

    /// Envelope magic does not match.
    #[error("bad envelope magic {0:#010x}")]
    BadMagic(u32),

    /// Envelope version is not supported.
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    /// Opcode byte does not name a session-management operation.
    #[error("unknown session-management opcode {0}")]
    UnknownOpcode(u8),

    /// Declared payload length disagrees with the bytes actually present.
    #[error("declared payload length {declared} does not match {actual} trailing bytes")]
    LengthMismatch {
        /// Payload length declared in the envelope.
        declared: usize,
        /// Bytes following the envelope.
        actual: usize,
    },

    /// Payload exceeds the fixed cap.
    #[error("payload of {len} bytes exceeds the {} byte limit", SmPacket::MAX_PAYLOAD)]
    PayloadTooLarge {
        /// Length of the offending payload.
        len: usize,
    },
}
