//! Per-endpoint hook: the mailbox bundle an endpoint shares with the hub.

use parking_lot::Mutex;
use spindle_proto::SmPacket;

use crate::error::{HubError, Result};
use crate::mailbox::Mailbox;
use crate::work::{EndpointId, WorkItem};

/// Number of endpoint ids the registry supports. Ids are `u8`, so the
/// registry covers the full id space.
pub const MAX_ENDPOINTS: usize = 256;

/// State the hub grants a hook at registration: one submission mailbox per
/// background worker, plus the registration generation used to fence stale
/// completions.
#[derive(Debug)]
struct Submission {
    queues: Vec<Mailbox<WorkItem>>,
    generation: u64,
}

/// The only state an RPC endpoint thread shares with the hub.
///
/// Created and owned by the endpoint (typically inside an `Arc`), registered
/// with [`crate::Hub::register_hook`]. The registry stores a clone of the
/// `Arc` that is valid only between registration and unregistration; the
/// endpoint's own clone outlives both.
///
/// Inbound session-management packets and background-work completions are
/// pushed by hub-owned threads and drained by the owning endpoint thread.
/// The submission mailboxes are populated by the hub, never by the endpoint.
#[derive(Debug)]
pub struct EndpointHook {
    id: EndpointId,
    sm_inbox: Mailbox<SmPacket>,
    completions: Mailbox<WorkItem>,
    submission: Mutex<Option<Submission>>,
}

impl EndpointHook {
    /// Create an unregistered hook for `id`.
    pub fn new(id: EndpointId) -> Self {
        Self {
            id,
            sm_inbox: Mailbox::new(),
            completions: Mailbox::new(),
            submission: Mutex::new(None),
        }
    }

    /// Endpoint id this hook belongs to.
    pub fn id(&self) -> EndpointId {
        self.id
    }

    /// Pop one inbound session-management packet, if any.
    pub fn try_packet(&self) -> Option<SmPacket> {
        self.sm_inbox.try_pop()
    }

    /// Drain all inbound session-management packets in arrival order.
    pub fn drain_packets(&self) -> Vec<SmPacket> {
        self.sm_inbox.drain()
    }

    /// Pop one background-work completion, if any.
    pub fn try_completion(&self) -> Option<WorkItem> {
        self.completions.try_pop()
    }

    /// Drain all background-work completions in arrival order.
    pub fn drain_completions(&self) -> Vec<WorkItem> {
        self.completions.drain()
    }

    /// Submit a work item to the hub's background pool.
    ///
    /// The target worker is chosen by `session_id % num_workers`, so items
    /// from one session always run on the same worker and complete in
    /// submission order. Exactly one completion later appears in this hook's
    /// completion mailbox, unless the hook is unregistered in the meantime.
    ///
    /// # Errors
    ///
    /// [`HubError::NotRegistered`] if the hook is not currently registered;
    /// [`HubError::NoWorkers`] if the hub owns no background workers.
    pub fn submit(&self, mut item: WorkItem) -> Result<()> {
        let submission = self.submission.lock();
        let Some(submission) = submission.as_ref() else {
            return Err(HubError::NotRegistered(self.id));
        };
        if submission.queues.is_empty() {
            return Err(HubError::NoWorkers);
        }

        item.generation = submission.generation;
        let index = (item.session_id % submission.queues.len() as u64) as usize;
        submission.queues[index].push(item);
        Ok(())
    }

    /// Called by the hub's listener thread, with the hub lock held.
    pub(crate) fn deliver_packet(&self, packet: SmPacket) {
        self.sm_inbox.push(packet);
    }

    /// Called by background workers, with the hub lock held.
    pub(crate) fn deliver_completion(&self, item: WorkItem) {
        self.completions.push(item);
    }

    /// Called by the hub at registration, with the hub lock held.
    pub(crate) fn attach_workers(&self, queues: &[Mailbox<WorkItem>], generation: u64) {
        *self.submission.lock() = Some(Submission { queues: queues.to_vec(), generation });
    }

    /// Called by the hub at unregistration, with the hub lock held.
    pub(crate) fn detach_workers(&self) {
        *self.submission.lock() = None;
    }
}
