//! Deferred single-threaded execution
//!
//! All face state lives inside a [`DeferredExecutor`]: an actor-style
//! driver task that owns the state and drains a mailbox of boxed
//! `FnOnce(&mut S)` tasks, so every mutation happens on one logical
//! thread no matter which thread posted it.
//!
//! Lifetime discipline: the executor handle holds the only strong sender.
//! Everything that re-enters the mailbox later — timers, cancellation
//! handles, the receive pump — holds a [`WeakExecutor`] and upgrades it at
//! fire time. If the upgrade fails the task is skipped silently, so work
//! queued across the face's teardown can never touch freed state.
//! Stopping the driver drops still-queued tasks unrun for the same
//! reason.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Command<S> {
    Run(Task<S>),
    Stop(Option<oneshot::Sender<()>>),
}

/// Owning handle to a driver task. Cheap to clone; dropping the last
/// clone lets the driver drain its mailbox and exit.
pub struct DeferredExecutor<S> {
    tx: mpsc::UnboundedSender<Command<S>>,
}

/// Non-owning executor handle, upgraded at fire time.
pub struct WeakExecutor<S> {
    tx: mpsc::WeakUnboundedSender<Command<S>>,
}

impl<S> Clone for DeferredExecutor<S> {
    fn clone(&self) -> Self {
        DeferredExecutor { tx: self.tx.clone() }
    }
}

impl<S> Clone for WeakExecutor<S> {
    fn clone(&self) -> Self {
        WeakExecutor { tx: self.tx.clone() }
    }
}

impl<S: Send + 'static> DeferredExecutor<S> {
    /// Spawn a driver task owning the state produced by `build`.
    ///
    /// `build` receives a weak handle to the executor being created, so
    /// the state can re-enter its own mailbox without keeping the driver
    /// alive on its own. Must be called inside a tokio runtime.
    pub fn spawn_with(build: impl FnOnce(WeakExecutor<S>) -> S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = build(WeakExecutor { tx: tx.downgrade() });
        tokio::spawn(drive(rx, state));
        DeferredExecutor { tx }
    }

    /// Enqueue `task` for immediate, in-order execution. Silently dropped
    /// if the driver has stopped.
    pub fn post(&self, task: impl FnOnce(&mut S) + Send + 'static) {
        let _ = self.tx.send(Command::Run(Box::new(task)));
    }

    /// Enqueue `task` to run no earlier than `delay` from now.
    ///
    /// The returned handle aborts the timer when cancelled or dropped. A
    /// timer that fires after the driver stopped skips its task silently.
    pub fn schedule(
        &self,
        delay: Duration,
        task: impl FnOnce(&mut S) + Send + 'static,
    ) -> ScheduledTask {
        spawn_timer(self.tx.downgrade(), delay, task)
    }

    /// Stop the driver. Tasks already queued ahead of the stop still run;
    /// tasks queued behind it are dropped unrun. `ack` fires once the
    /// driver has processed the stop.
    pub fn stop(&self, ack: Option<oneshot::Sender<()>>) {
        let _ = self.tx.send(Command::Stop(ack));
    }

    pub fn downgrade(&self) -> WeakExecutor<S> {
        WeakExecutor { tx: self.tx.downgrade() }
    }
}

impl<S: Send + 'static> WeakExecutor<S> {
    /// Enqueue `task` if the driver is still alive. Returns false (and
    /// drops the task) once it is gone.
    pub fn post(&self, task: impl FnOnce(&mut S) + Send + 'static) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(Command::Run(Box::new(task))).is_ok(),
            None => false,
        }
    }

    /// Enqueue `task` to run no earlier than `delay` from now; skipped
    /// silently if the driver is gone by then.
    pub fn schedule(
        &self,
        delay: Duration,
        task: impl FnOnce(&mut S) + Send + 'static,
    ) -> ScheduledTask {
        spawn_timer(self.tx.clone(), delay, task)
    }

    /// Recover an owning handle, or `None` once the last one is gone.
    pub fn upgrade(&self) -> Option<DeferredExecutor<S>> {
        self.tx.upgrade().map(|tx| DeferredExecutor { tx })
    }
}

/// Cancellable handle to one scheduled task. Aborts its timer on drop, so
/// owners cancel pending timeouts simply by discarding the handle.
#[derive(Debug)]
pub struct ScheduledTask {
    timer: AbortHandle,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.timer.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

fn spawn_timer<S: Send + 'static>(
    tx: mpsc::WeakUnboundedSender<Command<S>>,
    delay: Duration,
    task: impl FnOnce(&mut S) + Send + 'static,
) -> ScheduledTask {
    // The timer holds only the weak sender while sleeping; it resolves at
    // fire time and skips silently when the driver is gone.
    let timer = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(Command::Run(Box::new(task)));
        }
    });
    ScheduledTask { timer: timer.abort_handle() }
}

async fn drive<S>(mut rx: mpsc::UnboundedReceiver<Command<S>>, mut state: S) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Run(task) => task(&mut state),
            Command::Stop(ack) => {
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                break;
            }
        }
    }
    // Dropping the receiver here discards any tasks queued behind a stop.
}
