//! Background worker loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::config::SHUTDOWN_POLL_INTERVAL;
use crate::hub::HubShared;
use crate::mailbox::Mailbox;
use crate::work::WorkItem;

/// Per-worker-thread state, owned by the hub for the process lifetime.
pub(crate) struct WorkerContext {
    pub(crate) index: usize,
    pub(crate) inbox: Mailbox<WorkItem>,
    pub(crate) shared: Arc<HubShared>,
    pub(crate) shutdown: Arc<AtomicBool>,
}

/// Worker-thread body: drain inbound work items, execute the registered
/// operation for each item's request type, and push the completion back to
/// the originating hook.
///
/// The single running state waits on the mailbox with a bounded timeout, so
/// the shutdown flag is observed within one poll interval without a busy
/// spin. The handler runs without the hub lock; the lock is taken only to
/// resolve the operation and to revalidate the originating hook before
/// delivery, so a hook unregistered (or re-registered) mid-flight never
/// receives the stale completion.
pub(crate) fn worker_loop(ctx: WorkerContext) {
    debug!(worker = ctx.index, "background worker started");

    while !ctx.shutdown.load(Ordering::Acquire) {
        let Some(mut item) = ctx.inbox.pop_timeout(SHUTDOWN_POLL_INTERVAL) else {
            continue;
        };

        let ops = ctx.shared.registry.lock().ops[item.request_type as usize].clone();
        let Some(ops) = ops else {
            warn!(
                worker = ctx.index,
                request_type = item.request_type,
                "dropping work item with no registered operation"
            );
            continue;
        };
        ops.invoke(&mut item);

        let registry = ctx.shared.registry.lock();
        match &registry.hooks[item.origin as usize] {
            Some(entry) if entry.generation == item.generation => {
                entry.hook.deliver_completion(item);
            },
            Some(_) | None => {
                debug!(
                    worker = ctx.index,
                    endpoint = item.origin,
                    "origin endpoint gone, dropping completion"
                );
            },
        }
    }

    debug!(worker = ctx.index, "background worker stopped");
}
