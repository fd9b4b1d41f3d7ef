//! Process-wide coordination hub for the Spindle RPC transport.
//!
//! One [`Hub`] exists per process. RPC endpoint threads register an
//! [`EndpointHook`] with it to take part in session management and background
//! work offload; the hub owns the registry of hooks, a fixed pool of
//! background worker threads, and the UDP listener for out-of-band
//! session-management packets (the handshake/teardown channel, distinct from
//! the data-plane RPC path).
//!
//! # Architecture
//!
//! Every cross-thread handoff goes through a [`Mailbox`]: inbound
//! session-management packets, background work submissions, and work
//! completions. The hook registry, the operation table, and its freeze flag
//! are the only state guarded by the hub lock; mailboxes are internally
//! synchronized and used without it once a hook handle is held.
//!
//! ```text
//! endpoint thread                hub                      worker threads
//! ──────────────────────────────────────────────────────────────────────
//! register_hook ──────────▶ registry (lock) ──┐
//!                                             │ fills per-worker
//! hook.submit(item) ──▶ worker mailbox ───────┴──▶ pop → run op
//!                                                    │
//! hook completions ◀──────── registry lookup ◀───────┘
//!
//! UDP datagram ──▶ listener thread ──▶ drop? ──▶ registry (lock) ──▶ hook inbox
//! ```
//!
//! The listener thread stands in for the original's signal-driven I/O path:
//! it blocks on the socket with a bounded timeout and routes each datagram
//! under the same lock discipline as any other caller. Synthetic packet loss
//! (configurable, ≤ 0.95) exercises the upper layer's retransmission
//! protocol.
//!
//! No async: all waiting is OS-thread blocking with bounded timeouts, and
//! shutdown is cooperative through one shared flag observed within the
//! 100 ms poll interval.

pub mod clock;
pub mod config;
pub mod error;
pub mod hook;
pub mod hub;
pub mod mailbox;
pub mod ops;
pub mod work;

mod worker;

pub use clock::CycleClock;
pub use config::{DEFAULT_MGMT_PORT, HubConfig, MAX_DROP_PROBABILITY, MAX_WORKERS};
pub use error::{HubError, Result};
pub use hook::{EndpointHook, MAX_ENDPOINTS};
pub use hub::Hub;
pub use mailbox::Mailbox;
pub use ops::{MAX_REQUEST_TYPES, Ops};
pub use work::{EndpointId, RequestType, WorkItem};
