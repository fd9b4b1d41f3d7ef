//! Wire envelope for Spindle session-management datagrams.
//!
//! Session-management packets (connect/disconnect handshakes) travel as UDP
//! datagrams: a fixed 12-byte envelope followed by an opaque payload. The
//! envelope carries exactly what the hub needs to route a datagram (the
//! target endpoint id) plus the usual magic/version/length framing. The
//! payload semantics belong to the session-management layer and are never
//! inspected here.
//!
//! All parsing uses compile-time verified layouts via `zerocopy`. Payloads
//! are capped at 1 KiB; session-management packets are small by design and
//! a single datagram never fragments.

pub mod errors;
pub mod header;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use header::{SmHeader, SmOpcode};
pub use packet::SmPacket;
