//! Deferred-work descriptor.

/// Process-local endpoint identifier. One per RPC endpoint thread.
pub type EndpointId = u8;

/// Request-type identifier, the key into the hub's operation table.
pub type RequestType = u8;

/// A unit of deferred session work, doubling as its own completion.
///
/// Allocated by the submitting endpoint, a work item travels through exactly
/// one worker mailbox and then through exactly one completion mailbox back to
/// the originating hook. The session and slot references are opaque to the
/// hub; only the worker's registered operation interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// Endpoint that submitted this item and will receive the completion.
    pub origin: EndpointId,
    /// Session the work refers to.
    pub session_id: u64,
    /// Slot within the session the work refers to.
    pub slot_index: usize,
    /// Request type, dispatched through the hub's operation table.
    pub request_type: RequestType,
    /// Registration generation of the submitting hook, stamped at
    /// submission. Completions whose generation no longer matches the
    /// registry are dropped instead of being delivered to a re-registered
    /// endpoint.
    pub(crate) generation: u64,
}

impl WorkItem {
    /// Describe a unit of work for `session_id`/`slot_index`, to be executed
    /// by the operation registered for `request_type`.
    pub fn new(
        origin: EndpointId,
        session_id: u64,
        slot_index: usize,
        request_type: RequestType,
    ) -> Self {
        Self { origin, session_id, slot_index, request_type, generation: 0 }
    }
}
