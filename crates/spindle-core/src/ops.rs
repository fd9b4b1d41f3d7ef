//! Application-defined operation table entries.

use std::fmt;
use std::sync::Arc;

use crate::work::WorkItem;

/// Number of distinct request types the operation table supports. Request
/// types are `u8`, so the table covers the full id space.
pub const MAX_REQUEST_TYPES: usize = 256;

/// Handler invoked by a background worker for one work item.
pub type RequestHandler = Arc<dyn Fn(&mut WorkItem) + Send + Sync>;

/// Application-defined operations for one request type.
///
/// Registered with [`crate::Hub::register_ops`] before any endpoint attaches;
/// the table freezes at the first hook registration and the hub's own copy is
/// the source of truth from then on.
#[derive(Clone)]
pub struct Ops {
    handler: RequestHandler,
}

impl Ops {
    /// Wrap a request handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut WorkItem) + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler) }
    }

    /// Run the handler against one work item.
    pub(crate) fn invoke(&self, item: &mut WorkItem) {
        (self.handler)(item);
    }
}

impl fmt::Debug for Ops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ops").finish_non_exhaustive()
    }
}
