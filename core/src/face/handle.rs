//! Cancellation handles
//!
//! Every operation that leaves state behind in the face returns a handle
//! that can withdraw it later. A handle holds only a weak executor
//! reference, so it never keeps the face alive, and cancelling after the
//! face has shut down is a silent no-op. Cancellation is idempotent:
//! cancelling an already-resolved or already-cancelled entry does
//! nothing.

use std::fmt;

use crate::executor::WeakExecutor;
use crate::tables::{FilterId, RegistrationId, RequestId};

use super::core::FaceCore;
use super::{UnregisterFailureCallback, UnregisterSuccessCallback};

const EMPTY_HANDLE_REASON: &str = "registered prefix handle is empty";

/// Handle to one pending request.
#[derive(Clone)]
pub struct PendingInterestHandle {
    executor: WeakExecutor<FaceCore>,
    id: RequestId,
}

impl PendingInterestHandle {
    pub(crate) fn new(executor: WeakExecutor<FaceCore>, id: RequestId) -> Self {
        PendingInterestHandle { executor, id }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Withdraw the request. None of its callbacks will fire afterwards.
    pub fn cancel(&self) {
        let id = self.id;
        self.executor.post(move |core| core.requests.remove(id));
    }

    /// Turn into a guard that cancels the request when dropped.
    pub fn scoped(self) -> ScopedPendingInterestHandle {
        ScopedPendingInterestHandle(self)
    }
}

impl fmt::Debug for PendingInterestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingInterestHandle").field("id", &self.id).finish()
    }
}

/// Handle to one Interest filter.
#[derive(Clone)]
pub struct InterestFilterHandle {
    executor: WeakExecutor<FaceCore>,
    id: FilterId,
}

impl InterestFilterHandle {
    pub(crate) fn new(executor: WeakExecutor<FaceCore>, id: FilterId) -> Self {
        InterestFilterHandle { executor, id }
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    /// Clear the filter. Interests received afterwards no longer reach
    /// its callback.
    pub fn cancel(&self) {
        let id = self.id;
        self.executor.post(move |core| core.filters.unset(id));
    }

    /// Turn into a guard that clears the filter when dropped.
    pub fn scoped(self) -> ScopedInterestFilterHandle {
        ScopedInterestFilterHandle(self)
    }
}

impl fmt::Debug for InterestFilterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterestFilterHandle").field("id", &self.id).finish()
    }
}

/// Handle to one prefix registration.
///
/// [`unregister`](Self::unregister) consumes the registration: the handle
/// is empty afterwards and further unregister calls report failure.
/// [`cancel`](Self::cancel) unregisters without reporting and leaves the
/// handle untouched. A default-constructed handle is empty.
#[derive(Clone, Default)]
pub struct RegisteredPrefixHandle {
    inner: Option<(WeakExecutor<FaceCore>, RegistrationId)>,
}

impl RegisteredPrefixHandle {
    pub(crate) fn new(executor: WeakExecutor<FaceCore>, id: RegistrationId) -> Self {
        RegisteredPrefixHandle { inner: Some((executor, id)) }
    }

    /// The registration's id, or `None` once the handle is empty.
    pub fn id(&self) -> Option<RegistrationId> {
        self.inner.as_ref().map(|(_, id)| *id)
    }

    /// Unregister without caring about the outcome. Safe to call any
    /// number of times; an empty handle does nothing.
    pub fn cancel(&self) {
        if let Some((executor, id)) = &self.inner {
            let id = *id;
            executor.post(move |core| core.start_unregistration(id, None, None));
        }
    }

    /// Unregister the prefix and hear back about the outcome.
    ///
    /// Empties the handle: a second call, or a call on a handle whose
    /// face is gone, invokes `on_failure` with an empty-handle reason.
    pub fn unregister(
        &mut self,
        on_success: Option<UnregisterSuccessCallback>,
        on_failure: Option<UnregisterFailureCallback>,
    ) {
        let Some((executor, id)) = self.inner.take() else {
            if let Some(on_failure) = on_failure {
                on_failure(EMPTY_HANDLE_REASON);
            }
            return;
        };
        match executor.upgrade() {
            Some(executor) => {
                executor.post(move |core| core.start_unregistration(id, on_success, on_failure));
            }
            None => {
                if let Some(on_failure) = on_failure {
                    on_failure(EMPTY_HANDLE_REASON);
                }
            }
        }
    }

    /// Turn into a guard that unregisters the prefix when dropped.
    pub fn scoped(self) -> ScopedRegisteredPrefixHandle {
        ScopedRegisteredPrefixHandle(self)
    }
}

impl fmt::Debug for RegisteredPrefixHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPrefixHandle").field("id", &self.id()).finish()
    }
}

/// Cancels its pending request when dropped.
#[derive(Debug)]
pub struct ScopedPendingInterestHandle(PendingInterestHandle);

impl ScopedPendingInterestHandle {
    pub fn handle(&self) -> &PendingInterestHandle {
        &self.0
    }
}

impl From<PendingInterestHandle> for ScopedPendingInterestHandle {
    fn from(handle: PendingInterestHandle) -> Self {
        ScopedPendingInterestHandle(handle)
    }
}

impl Drop for ScopedPendingInterestHandle {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Clears its Interest filter when dropped.
#[derive(Debug)]
pub struct ScopedInterestFilterHandle(InterestFilterHandle);

impl ScopedInterestFilterHandle {
    pub fn handle(&self) -> &InterestFilterHandle {
        &self.0
    }
}

impl From<InterestFilterHandle> for ScopedInterestFilterHandle {
    fn from(handle: InterestFilterHandle) -> Self {
        ScopedInterestFilterHandle(handle)
    }
}

impl Drop for ScopedInterestFilterHandle {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Unregisters its prefix when dropped, without reporting the outcome.
#[derive(Debug)]
pub struct ScopedRegisteredPrefixHandle(RegisteredPrefixHandle);

impl ScopedRegisteredPrefixHandle {
    pub fn handle(&self) -> &RegisteredPrefixHandle {
        &self.0
    }
}

impl From<RegisteredPrefixHandle> for ScopedRegisteredPrefixHandle {
    fn from(handle: RegisteredPrefixHandle) -> Self {
        ScopedRegisteredPrefixHandle(handle)
    }
}

impl Drop for ScopedRegisteredPrefixHandle {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
