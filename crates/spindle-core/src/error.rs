//! Error types for the coordination hub.

use std::io;

use thiserror::Error;

use crate::config::{MAX_DROP_PROBABILITY, MAX_WORKERS};
use crate::work::EndpointId;

/// Result type alias for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors surfaced by the hub.
///
/// Construction failures (`Bind`, `Socket`, `Hostname`, `Spawn`,
/// `InvalidDropProbability`, `TooManyWorkers`) abort [`crate::Hub::new`]
/// outright; there is no partially-constructed hub. The remaining variants
/// are non-fatal statuses returned synchronously to the caller that requested
/// the mutation.
#[derive(Debug, Error)]
pub enum HubError {
    /// The management UDP socket could not be bound.
    #[error("failed to bind management socket on port {port}")]
    Bind {
        /// Requested management port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The management socket could not be configured.
    #[error("failed to configure management socket")]
    Socket {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The local hostname could not be determined.
    #[error("failed to resolve local hostname")]
    Hostname {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A hub-owned thread could not be spawned.
    #[error("failed to spawn {thread} thread")]
    Spawn {
        /// Which thread failed to start.
        thread: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The synthetic drop probability is outside `[0, MAX_DROP_PROBABILITY]`.
    /// A probability of 1.0 would make the control channel permanently
    /// unusable and is disallowed by contract.
    #[error("synthetic drop probability {0} is outside [0, {MAX_DROP_PROBABILITY}]")]
    InvalidDropProbability(f64),

    /// More background workers were requested than the hub supports.
    #[error("worker count {requested} exceeds the maximum of {MAX_WORKERS}")]
    TooManyWorkers {
        /// Requested number of background workers.
        requested: usize,
    },

    /// The endpoint id is already present in the registry.
    #[error("endpoint id {0} is already registered")]
    DuplicateEndpoint(EndpointId),

    /// Operation registration was attempted after the table froze.
    #[error("operation table is frozen after the first endpoint registration")]
    OpsTableFrozen,

    /// The hook is not currently registered with a hub.
    #[error("hook for endpoint id {0} is not registered")]
    NotRegistered(EndpointId),

    /// The hub was constructed without background workers.
    #[error("hub has no background workers to accept work")]
    NoWorkers,
}
