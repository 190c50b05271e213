//! Pending-request table
//!
//! Correlates inbound Data and Nacks to outstanding requests and drives
//! timeouts. The table owns each request exclusively; resolution always
//! removes the entry before invoking its callback, so a request resolves
//! through at most one of onData / onNack / onTimeout no matter how
//! deliveries interleave.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{IdAllocator, RequestId};
use crate::executor::ScheduledTask;
use crate::face::{DataCallback, NackCallback, TimeoutCallback};
use crate::packet::{Data, Interest, Nack};

struct PendingRequest {
    interest: Interest,
    on_data: DataCallback,
    on_nack: NackCallback,
    on_timeout: TimeoutCallback,
    // Held for its drop side effect: removing the entry aborts the timer.
    _timeout: ScheduledTask,
}

pub(crate) struct RequestRegistry {
    ids: Arc<IdAllocator>,
    entries: BTreeMap<RequestId, PendingRequest>,
}

impl RequestRegistry {
    pub(crate) fn new(ids: Arc<IdAllocator>) -> Self {
        RequestRegistry { ids, entries: BTreeMap::new() }
    }

    /// Fresh id, never reused for this face.
    pub(crate) fn allocate(&self) -> RequestId {
        RequestId(self.ids.next())
    }

    /// Record a request. The interest is expected to carry a nonce by the
    /// time it reaches the table; `timeout` is the scheduled timeout task
    /// whose handle dies with the entry.
    pub(crate) fn express(
        &mut self,
        id: RequestId,
        interest: Interest,
        on_data: DataCallback,
        on_nack: NackCallback,
        on_timeout: TimeoutCallback,
        timeout: ScheduledTask,
    ) {
        trace!(%id, name = %interest.name, "request pending");
        self.entries.insert(
            id,
            PendingRequest { interest, on_data, on_nack, on_timeout, _timeout: timeout },
        );
    }

    /// Resolve every pending request that `data` satisfies. Matches are
    /// snapshotted first, then each entry is removed before its onData
    /// runs. Returns how many requests were satisfied.
    pub(crate) fn satisfy(&mut self, data: &Data) -> usize {
        let matches: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.interest.matches_data(data))
            .map(|(id, _)| *id)
            .collect();
        for id in &matches {
            if let Some(entry) = self.entries.remove(id) {
                trace!(id = %id, name = %entry.interest.name, "request satisfied");
                (entry.on_data)(&entry.interest, data);
            }
        }
        matches.len()
    }

    /// Resolve the request(s) whose nonce matches the Nack's carried
    /// Interest nonce. A Nack without a nonce, or with no matching entry,
    /// resolves nothing — stale Nacks are dropped by the caller.
    pub(crate) fn nack(&mut self, nack: &Nack) -> usize {
        let nonce = match nack.interest.nonce {
            Some(nonce) => nonce,
            None => return 0,
        };
        let matches: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.interest.nonce == Some(nonce))
            .map(|(id, _)| *id)
            .collect();
        for id in &matches {
            if let Some(entry) = self.entries.remove(id) {
                trace!(id = %id, name = %entry.interest.name, reason = %nack.reason, "request nacked");
                (entry.on_nack)(&entry.interest, nack);
            }
        }
        matches.len()
    }

    /// Timeout fire path: resolve through onTimeout if the id is still
    /// present; a request already resolved or cancelled is a no-op.
    pub(crate) fn timeout(&mut self, id: RequestId) {
        if let Some(entry) = self.entries.remove(&id) {
            debug!(%id, name = %entry.interest.name, "request timed out");
            (entry.on_timeout)(&entry.interest);
        }
    }

    /// Explicit cancellation; invokes nothing, no-op if absent.
    pub(crate) fn remove(&mut self, id: RequestId) {
        if self.entries.remove(&id).is_some() {
            trace!(%id, "request cancelled");
        }
    }

    /// Shutdown path: clear everything without invoking any callback.
    pub(crate) fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::DeferredExecutor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn registry() -> RequestRegistry {
        RequestRegistry::new(Arc::new(IdAllocator::new()))
    }

    /// A timer that never fires within a test; dropped with its entry.
    fn inert_timer(exec: &DeferredExecutor<()>) -> ScheduledTask {
        exec.schedule(Duration::from_secs(3600), |_| {})
    }

    struct Counters {
        data: AtomicUsize,
        nack: AtomicUsize,
        timeout: AtomicUsize,
    }

    impl Counters {
        fn new() -> Arc<Self> {
            Arc::new(Counters {
                data: AtomicUsize::new(0),
                nack: AtomicUsize::new(0),
                timeout: AtomicUsize::new(0),
            })
        }
    }

    fn express(
        registry: &mut RequestRegistry,
        exec: &DeferredExecutor<()>,
        interest: Interest,
        counters: &Arc<Counters>,
    ) -> RequestId {
        let id = registry.allocate();
        let (c1, c2, c3) = (counters.clone(), counters.clone(), counters.clone());
        registry.express(
            id,
            interest,
            Box::new(move |_, _| {
                c1.data.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move |_, _| {
                c2.nack.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move |_| {
                c3.timeout.fetch_add(1, Ordering::SeqCst);
            }),
            inert_timer(exec),
        );
        id
    }

    // ========== Satisfaction ==========

    #[tokio::test]
    async fn data_satisfies_exact_request_once() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        express(&mut registry, &exec, Interest::new("/a").with_nonce(1), &counters);

        assert_eq!(registry.satisfy(&Data::new("/a", "")), 1);
        assert_eq!(registry.len(), 0);
        // A second identical Data finds nothing.
        assert_eq!(registry.satisfy(&Data::new("/a", "")), 0);
        assert_eq!(counters.data.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_data_satisfies_all_matching_requests() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        for i in 0..3 {
            express(
                &mut registry,
                &exec,
                Interest::new("/a").with_can_be_prefix(true).with_nonce(i),
                &counters,
            );
        }
        express(&mut registry, &exec, Interest::new("/other").with_nonce(99), &counters);

        assert_eq!(registry.satisfy(&Data::new("/a/b", "")), 3);
        assert_eq!(counters.data.load(Ordering::SeqCst), 3);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn exact_request_ignores_longer_names() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        express(&mut registry, &exec, Interest::new("/a").with_nonce(1), &counters);

        assert_eq!(registry.satisfy(&Data::new("/a/b", "")), 0);
        assert_eq!(registry.len(), 1);
    }

    // ========== Nacks ==========

    #[tokio::test]
    async fn nack_resolves_by_nonce() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        express(&mut registry, &exec, Interest::new("/a").with_nonce(42), &counters);

        let nack = Nack::new(Interest::new("/a").with_nonce(42), crate::packet::NackReason::NoRoute);
        assert_eq!(registry.nack(&nack), 1);
        assert_eq!(counters.nack.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn stale_nack_resolves_nothing() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        express(&mut registry, &exec, Interest::new("/a").with_nonce(1), &counters);

        let stale = Nack::new(Interest::new("/a").with_nonce(777), crate::packet::NackReason::Duplicate);
        assert_eq!(registry.nack(&stale), 0);
        assert_eq!(counters.nack.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn nack_without_nonce_is_ignored() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        express(&mut registry, &exec, Interest::new("/a").with_nonce(1), &counters);

        let nack = Nack::new(Interest::new("/a"), crate::packet::NackReason::Congestion);
        assert_eq!(registry.nack(&nack), 0);
        assert_eq!(registry.len(), 1);
    }

    // ========== At-most-one resolution ==========

    #[tokio::test]
    async fn request_resolves_through_exactly_one_path() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        let id = express(&mut registry, &exec, Interest::new("/a").with_nonce(5), &counters);

        assert_eq!(registry.satisfy(&Data::new("/a", "")), 1);
        // Late nack and late timeout are both no-ops now.
        let nack = Nack::new(Interest::new("/a").with_nonce(5), crate::packet::NackReason::NoRoute);
        assert_eq!(registry.nack(&nack), 0);
        registry.timeout(id);

        assert_eq!(counters.data.load(Ordering::SeqCst), 1);
        assert_eq!(counters.nack.load(Ordering::SeqCst), 0);
        assert_eq!(counters.timeout.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timeout_fires_once_and_only_if_present() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        let id = express(&mut registry, &exec, Interest::new("/a").with_nonce(5), &counters);

        registry.timeout(id);
        registry.timeout(id);
        assert_eq!(counters.timeout.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    // ========== Cancellation ==========

    #[tokio::test]
    async fn remove_is_idempotent_and_silent() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        let id = express(&mut registry, &exec, Interest::new("/a").with_nonce(5), &counters);

        registry.remove(id);
        registry.remove(id);
        assert_eq!(registry.len(), 0);
        assert_eq!(counters.data.load(Ordering::SeqCst), 0);
        assert_eq!(counters.nack.load(Ordering::SeqCst), 0);
        assert_eq!(counters.timeout.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remove_all_invokes_nothing() {
        let exec = DeferredExecutor::spawn_with(|_| ());
        let mut registry = registry();
        let counters = Counters::new();
        for i in 0..4 {
            express(&mut registry, &exec, Interest::new("/a").with_nonce(i), &counters);
        }

        registry.remove_all();
        assert_eq!(registry.len(), 0);
        assert_eq!(counters.data.load(Ordering::SeqCst), 0);
        assert_eq!(counters.timeout.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn allocate_never_reuses_ids() {
        let registry = registry();
        let a = registry.allocate();
        let b = registry.allocate();
        assert_ne!(a, b);
    }
}
