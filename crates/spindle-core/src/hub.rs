//! The one-per-process coordination hub.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spindle_proto::SmPacket;
use tracing::{debug, info, trace, warn};

use crate::clock::CycleClock;
use crate::config::{HubConfig, SHUTDOWN_POLL_INTERVAL};
use crate::error::{HubError, Result};
use crate::hook::{EndpointHook, MAX_ENDPOINTS};
use crate::mailbox::Mailbox;
use crate::ops::{MAX_REQUEST_TYPES, Ops};
use crate::work::{EndpointId, RequestType, WorkItem};
use crate::worker::{WorkerContext, worker_loop};

/// A hook entry in the registry, tagged with the generation assigned at
/// registration so stale completions can be fenced after a re-registration
/// of the same id.
pub(crate) struct RegisteredHook {
    pub(crate) hook: Arc<EndpointHook>,
    pub(crate) generation: u64,
}

/// Everything guarded by the hub lock: the hook registry, the operation
/// table, and the freeze flag. No other path may touch these.
pub(crate) struct Registry {
    pub(crate) hooks: Vec<Option<RegisteredHook>>,
    pub(crate) ops: Vec<Option<Ops>>,
    pub(crate) ops_frozen: bool,
    next_generation: u64,
}

impl Registry {
    fn new() -> Self {
        Self {
            hooks: (0..MAX_ENDPOINTS).map(|_| None).collect(),
            ops: (0..MAX_REQUEST_TYPES).map(|_| None).collect(),
            ops_frozen: false,
            next_generation: 1,
        }
    }
}

/// State shared between the hub, its listener thread, and its workers.
pub(crate) struct HubShared {
    pub(crate) registry: Mutex<Registry>,
    pub(crate) worker_queues: Vec<Mailbox<WorkItem>>,
}

/// The process-wide coordination hub.
///
/// Owns the endpoint-hook registry, the frozen-after-first-registration
/// operation table, the fixed background worker pool, and the UDP listener
/// for session-management packets. Construction is all-or-nothing; dropping
/// the hub stops and joins every owned thread.
pub struct Hub {
    config: HubConfig,
    hostname: String,
    clock: CycleClock,
    local_addr: SocketAddr,
    shared: Arc<HubShared>,
    shutdown: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl Hub {
    /// Construct the hub: bind the management socket, calibrate the cycle
    /// clock, cache the hostname, and start the listener plus exactly
    /// `config.num_workers` background worker threads.
    ///
    /// # Errors
    ///
    /// Fails with a single [`HubError`] if the configuration is invalid, the
    /// socket cannot be bound or configured, the hostname cannot be resolved,
    /// or any thread cannot be spawned. No partially-constructed hub is ever
    /// returned; threads spawned before a failure are stopped and joined.
    pub fn new(config: HubConfig) -> Result<Self> {
        config.validate()?;

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.mgmt_port))
            .map_err(|source| HubError::Bind { port: config.mgmt_port, source })?;
        // The bounded read timeout is what lets the listener observe the
        // shutdown flag; without it the final recv_from would block forever.
        socket
            .set_read_timeout(Some(SHUTDOWN_POLL_INTERVAL))
            .map_err(|source| HubError::Socket { source })?;
        let local_addr = socket.local_addr().map_err(|source| HubError::Socket { source })?;

        let hostname = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .map_err(|source| HubError::Hostname { source })?;
        let clock = CycleClock::calibrate();

        let worker_queues: Vec<Mailbox<WorkItem>> =
            (0..config.num_workers).map(|_| Mailbox::new()).collect();
        let shared = Arc::new(HubShared { registry: Mutex::new(Registry::new()), worker_queues });
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.num_workers);
        for index in 0..config.num_workers {
            let ctx = WorkerContext {
                index,
                inbox: shared.worker_queues[index].clone(),
                shared: Arc::clone(&shared),
                shutdown: Arc::clone(&shutdown),
            };
            let spawned = thread::Builder::new()
                .name(format!("spindle-bg-{index}"))
                .spawn(move || worker_loop(ctx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    Self::stop_threads(&shutdown, None, workers);
                    return Err(HubError::Spawn { thread: "background worker", source });
                },
            }
        }

        let listener = {
            let shared = Arc::clone(&shared);
            let shutdown = Arc::clone(&shutdown);
            let drop_probability = config.drop_probability;
            let listener_shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name("spindle-sm".into())
                .spawn(move || listener_loop(&socket, &shared, &listener_shutdown, drop_probability));
            match spawned {
                Ok(handle) => handle,
                Err(source) => {
                    Self::stop_threads(&shutdown, None, workers);
                    return Err(HubError::Spawn { thread: "session-management listener", source });
                },
            }
        };

        info!(
            port = local_addr.port(),
            workers = config.num_workers,
            drop_probability = config.drop_probability,
            "hub started"
        );

        Ok(Self {
            config,
            hostname,
            clock,
            local_addr,
            shared,
            shutdown,
            listener: Some(listener),
            workers,
        })
    }

    /// Whether a hook with `id` is currently registered. Callers must not
    /// hold the hub lock; it is acquired internally.
    pub fn endpoint_exists(&self, id: EndpointId) -> bool {
        self.shared.registry.lock().hooks[id as usize].is_some()
    }

    /// Register an endpoint hook.
    ///
    /// On success the hub stores a clone of the `Arc`, wires the hook's
    /// per-worker submission mailboxes, and on the first registration ever
    /// freezes the operation table.
    ///
    /// # Errors
    ///
    /// [`HubError::DuplicateEndpoint`] if the id is already registered; the
    /// registry is left unchanged.
    pub fn register_hook(&self, hook: &Arc<EndpointHook>) -> Result<()> {
        let id = hook.id();
        let mut registry = self.shared.registry.lock();

        if registry.hooks[id as usize].is_some() {
            return Err(HubError::DuplicateEndpoint(id));
        }

        // The first endpoint to attach relies on the table it sees; later
        // mutation would silently desynchronize dispatch.
        registry.ops_frozen = true;

        let generation = registry.next_generation;
        registry.next_generation += 1;
        hook.attach_workers(&self.shared.worker_queues, generation);
        registry.hooks[id as usize] = Some(RegisteredHook { hook: Arc::clone(hook), generation });

        debug!(endpoint = id, generation, "hook registered");
        Ok(())
    }

    /// Unregister an endpoint hook. No-op if this exact hook is not the one
    /// registered under its id.
    pub fn unregister_hook(&self, hook: &Arc<EndpointHook>) {
        let id = hook.id();
        let mut registry = self.shared.registry.lock();

        let is_registered_here = matches!(
            &registry.hooks[id as usize],
            Some(entry) if Arc::ptr_eq(&entry.hook, hook)
        );
        if is_registered_here {
            registry.hooks[id as usize] = None;
            hook.detach_workers();
            debug!(endpoint = id, "hook unregistered");
        } else if registry.hooks[id as usize].is_some() {
            debug!(endpoint = id, "unregister ignored, id owned by a different hook");
        }
    }

    /// Register application-defined operations for `request_type`,
    /// overwriting any prior entry for that type.
    ///
    /// # Errors
    ///
    /// [`HubError::OpsTableFrozen`] once any endpoint has registered; the
    /// table is immutable from that point on.
    pub fn register_ops(&self, request_type: RequestType, ops: Ops) -> Result<()> {
        let mut registry = self.shared.registry.lock();
        if registry.ops_frozen {
            return Err(HubError::OpsTableFrozen);
        }
        registry.ops[request_type as usize] = Some(ops);
        Ok(())
    }

    /// The local hostname, resolved once at construction.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The cycle clock calibrated at construction.
    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    /// Address the management socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The configuration this hub was constructed with.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn stop_threads(
        shutdown: &AtomicBool,
        listener: Option<JoinHandle<()>>,
        workers: Vec<JoinHandle<()>>,
    ) {
        shutdown.store(true, Ordering::Release);
        if let Some(handle) = listener {
            let _ = handle.join();
        }
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        Self::stop_threads(&self.shutdown, self.listener.take(), std::mem::take(&mut self.workers));
        info!(port = self.local_addr.port(), "hub stopped");
    }
}

/// Listener-thread body: wait for management datagrams with a bounded
/// timeout, apply synthetic loss, and route survivors under the hub lock.
///
/// This replaces the original design's kernel-signal trampoline; the handler
/// runs on this dedicated thread but takes the same lock as every other
/// registry caller, so nothing depends on which thread it is.
fn listener_loop(
    socket: &UdpSocket,
    shared: &HubShared,
    shutdown: &AtomicBool,
    drop_probability: f64,
) {
    let mut rng = SmallRng::from_entropy();
    let mut buf = [0u8; SmPacket::MAX_DATAGRAM];
    debug!("session-management listener started");

    while !shutdown.load(Ordering::Acquire) {
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _peer)) => len,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            },
            Err(e) => {
                warn!(error = %e, "management socket receive failed");
                continue;
            },
        };

        if drop_probability > 0.0 && rng.gen_range(0.0..1.0) < drop_probability {
            trace!(len, "synthetic drop");
            continue;
        }

        route_datagram(shared, &buf[..len]);
    }

    debug!("session-management listener stopped");
}

/// Decode one datagram and push it to the addressed endpoint's inbox.
///
/// Malformed datagrams and datagrams addressed to an unregistered id are
/// absorbed: the upper-layer retransmission protocol owns recovery.
fn route_datagram(shared: &HubShared, datagram: &[u8]) {
    let packet = match SmPacket::decode(datagram) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, len = datagram.len(), "malformed session-management datagram");
            return;
        },
    };

    let registry = shared.registry.lock();
    match &registry.hooks[packet.endpoint_id() as usize] {
        Some(entry) => {
            trace!(
                endpoint = packet.endpoint_id(),
                opcode = ?packet.opcode(),
                "delivering session-management packet"
            );
            entry.hook.deliver_packet(packet);
        },
        None => {
            trace!(endpoint = packet.endpoint_id(), "no hook registered, discarding");
        },
    }
}
