//! Face construction and lifecycle
//!
//! The [`Face`] handle is cheap to clone and safe to use from any task.
//! All mutable state lives in a [`FaceCore`] owned by a deferred
//! executor; operations post tasks into it and results come back through
//! callbacks. Implementation is split across:
//! - `core.rs` (this file): construction, shutdown, state queries
//! - `api.rs`: packet operations
//! - `register.rs`: prefix-registration command flow

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::control::CommandSigner;
use crate::dispatch::classify;
use crate::executor::{DeferredExecutor, WeakExecutor};
use crate::tables::filters::FilterRegistry;
use crate::tables::registrations::PrefixRegistrationManager;
use crate::tables::requests::RequestRegistry;
use crate::tables::IdAllocator;
use crate::transport::Transport;

use super::config::FaceConfig;
use super::error::FaceError;

/// Id sources shared between the face handle (which allocates before
/// posting) and the tables inside the executor.
pub(crate) struct FaceIds {
    pub(crate) requests: Arc<IdAllocator>,
    pub(crate) filters: Arc<IdAllocator>,
    pub(crate) registrations: Arc<IdAllocator>,
}

impl FaceIds {
    fn new() -> Self {
        FaceIds {
            requests: Arc::new(IdAllocator::new()),
            filters: Arc::new(IdAllocator::new()),
            registrations: Arc::new(IdAllocator::new()),
        }
    }
}

/// Face state owned by the deferred executor. Touched only from executor
/// tasks, never concurrently.
pub(crate) struct FaceCore {
    pub(crate) config: FaceConfig,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) signer: Box<dyn CommandSigner>,
    pub(crate) requests: RequestRegistry,
    pub(crate) filters: FilterRegistry,
    pub(crate) registrations: PrefixRegistrationManager,
    /// Weak self-reference for timers and command continuations.
    pub(crate) executor: WeakExecutor<FaceCore>,
    /// Sequence component source for registration commands.
    pub(crate) command_seq: u64,
}

impl FaceCore {
    /// Hand an encoded block to the transport. Failures are logged and
    /// otherwise swallowed; the request path relies on timeouts to
    /// surface loss.
    pub(crate) fn send_block(&mut self, block: Vec<u8>) {
        if let Err(e) = self.transport.send(block) {
            warn!(error = %e, "transport send failed");
        }
    }

    /// Shutdown path: drop all tables without firing any callback, then
    /// close the transport if it is still up.
    fn teardown(&mut self) {
        let requests = self.requests.len();
        let filters = self.filters.len();
        let registrations = self.registrations.len();
        self.requests.remove_all();
        self.filters.remove_all();
        self.registrations.remove_all();
        if self.transport.is_connected() {
            self.transport.close();
        }
        info!(requests, filters, registrations, "face torn down");
    }
}

/// The application's endpoint: sends Interests and Data over one
/// transport and delivers responses through callbacks.
///
/// Cloning is cheap; clones share the same face. Dropping every clone
/// without calling [`shutdown`](Face::shutdown) lets queued work finish
/// and then stops the face without closing the transport.
#[derive(Clone)]
pub struct Face {
    pub(crate) executor: DeferredExecutor<FaceCore>,
    pub(crate) ids: Arc<FaceIds>,
    pub(crate) config: FaceConfig,
    running: Arc<AtomicBool>,
}

impl Face {
    /// Create a face over `transport`, signing prefix-registration
    /// commands with `signer`.
    ///
    /// Takes over the transport's receive channel and pumps it from a
    /// background task. Must be called inside a tokio runtime.
    pub fn new(
        mut transport: impl Transport,
        signer: impl CommandSigner,
        config: FaceConfig,
    ) -> Self {
        let ids = Arc::new(FaceIds::new());
        let receiver = transport.take_receiver();

        let core_ids = ids.clone();
        let core_config = config.clone();
        let executor = DeferredExecutor::spawn_with(move |weak| FaceCore {
            config: core_config,
            transport: Box::new(transport),
            signer: Box::new(signer),
            requests: RequestRegistry::new(core_ids.requests.clone()),
            filters: FilterRegistry::new(core_ids.filters.clone()),
            registrations: PrefixRegistrationManager::new(core_ids.registrations.clone()),
            executor: weak,
            command_seq: rand::random::<u32>() as u64,
        });

        match receiver {
            Some(rx) => spawn_receive_pump(executor.downgrade(), rx, config.max_packet_size),
            None => warn!("transport receiver already taken; face will not receive"),
        }

        info!(max_packet_size = config.max_packet_size, "face created");
        Face { executor, ids, config, running: Arc::new(AtomicBool::new(true)) }
    }

    /// Shut the face down.
    ///
    /// Pending requests, filters and registrations are dropped without
    /// firing any callback, work queued behind the shutdown is discarded,
    /// and the transport is closed if still connected. Idempotent;
    /// returns once teardown has run.
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.executor.post(FaceCore::teardown);
        let (ack_tx, ack_rx) = oneshot::channel();
        self.executor.stop(Some(ack_tx));
        let _ = ack_rx.await;
        debug!("face shut down");
    }

    /// False once [`shutdown`](Face::shutdown) has begun.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn check_running(&self) -> Result<(), FaceError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(FaceError::Shutdown);
        }
        Ok(())
    }

    /// Read a value out of the face's state. `None` once the face has
    /// stopped.
    pub(crate) async fn query<T: Send + 'static>(
        &self,
        read: impl FnOnce(&FaceCore) -> T + Send + 'static,
    ) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.executor.post(move |core| {
            let _ = tx.send(read(core));
        });
        rx.await.ok()
    }

    /// Wait until queued work has drained. Several rounds, so work that
    /// re-enters the mailbox (the receive pump, weak-posted command
    /// continuations) drains too.
    #[cfg(test)]
    pub(crate) async fn settle(&self) {
        for _ in 0..4 {
            tokio::task::yield_now().await;
            let _ = self.query(|_| ()).await;
        }
    }
}

/// Pump inbound blocks from the transport into the executor. Stops when
/// the transport side closes the channel or the face is gone.
fn spawn_receive_pump(
    executor: WeakExecutor<FaceCore>,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    max_packet_size: usize,
) {
    tokio::spawn(async move {
        while let Some(block) = rx.recv().await {
            match classify(&block, max_packet_size) {
                Ok(packet) => {
                    if !executor.post(move |core| core.route(packet)) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, octets = block.len(), "dropping malformed block");
                }
            }
        }
        trace!("receive pump stopped");
    });
}
