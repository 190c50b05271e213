//! Prefix-registration table
//!
//! One record per forwarding-layer registration, stepping through
//! Created -> CommandSent -> Registered | Failed as its signed command is
//! sent and answered. The table also tracks an in-flight unregistration
//! per record so the mirror command is never issued twice. Registration
//! lifetime is independent of any Interest filter the caller installed
//! alongside it; this table never touches the filter table.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use super::{IdAllocator, RegistrationId, RequestId};
use crate::control::{RegistrationOptions, SigningInfo};
use crate::face::{
    RegisterFailureCallback, RegisterSuccessCallback, UnregisterFailureCallback,
    UnregisterSuccessCallback,
};
use crate::packet::Name;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RegistrationState {
    Created,
    CommandSent,
    Registered,
    Failed,
}

struct Registration {
    prefix: Name,
    options: RegistrationOptions,
    signing: SigningInfo,
    state: RegistrationState,
    /// The pending register command's request, cancellable by an early
    /// unregistration.
    command: Option<RequestId>,
    unregistering: bool,
    on_success: Option<RegisterSuccessCallback>,
    on_failure: Option<RegisterFailureCallback>,
    on_unregister_success: Option<UnregisterSuccessCallback>,
    on_unregister_failure: Option<UnregisterFailureCallback>,
}

/// How an unregistration request begins. Decided by the table; acted on
/// by the command flow.
pub(crate) enum UnregisterStart {
    /// No record under this id; hand the failure callback back.
    NotFound {
        on_failure: Option<UnregisterFailureCallback>,
    },
    /// A mirror command is already in flight for this record.
    AlreadyInProgress {
        on_failure: Option<UnregisterFailureCallback>,
    },
    /// The registration never took effect; the record is already removed
    /// and no command is needed.
    LocalOnly {
        on_success: Option<UnregisterSuccessCallback>,
    },
    /// Send the mirror command. `cancel` is the still-pending register
    /// command to withdraw first, if any.
    Command { cancel: Option<RequestId> },
}

pub(crate) struct PrefixRegistrationManager {
    ids: Arc<IdAllocator>,
    entries: BTreeMap<RegistrationId, Registration>,
}

impl PrefixRegistrationManager {
    pub(crate) fn new(ids: Arc<IdAllocator>) -> Self {
        PrefixRegistrationManager { ids, entries: BTreeMap::new() }
    }

    pub(crate) fn allocate(&self) -> RegistrationId {
        RegistrationId(self.ids.next())
    }

    /// Record a fresh registration in the Created state.
    pub(crate) fn insert(
        &mut self,
        id: RegistrationId,
        prefix: Name,
        options: RegistrationOptions,
        signing: SigningInfo,
        on_success: Option<RegisterSuccessCallback>,
        on_failure: Option<RegisterFailureCallback>,
    ) {
        trace!(%id, %prefix, "registration created");
        self.entries.insert(
            id,
            Registration {
                prefix,
                options,
                signing,
                state: RegistrationState::Created,
                command: None,
                unregistering: false,
                on_success,
                on_failure,
                on_unregister_success: None,
                on_unregister_failure: None,
            },
        );
    }

    /// Everything needed to build this record's command.
    pub(crate) fn command_context(
        &self,
        id: RegistrationId,
    ) -> Option<(Name, RegistrationOptions, SigningInfo)> {
        self.entries
            .get(&id)
            .map(|entry| (entry.prefix.clone(), entry.options.clone(), entry.signing.clone()))
    }

    /// The register command went out as `request`.
    pub(crate) fn command_sent(&mut self, id: RegistrationId, request: RequestId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.state = RegistrationState::CommandSent;
            entry.command = Some(request);
        }
    }

    /// The forwarder accepted the registration. Returns the prefix and
    /// success callback to fire, or `None` if the record is gone, already
    /// resolved, or being unregistered.
    pub(crate) fn acknowledge(
        &mut self,
        id: RegistrationId,
    ) -> Option<(Name, Option<RegisterSuccessCallback>)> {
        let entry = self.entries.get_mut(&id)?;
        if entry.state != RegistrationState::CommandSent || entry.unregistering {
            return None;
        }
        entry.state = RegistrationState::Registered;
        entry.command = None;
        trace!(%id, prefix = %entry.prefix, "registration acknowledged");
        Some((entry.prefix.clone(), entry.on_success.take()))
    }

    /// The registration failed. Returns the prefix and failure callback
    /// to fire, or `None` under the same conditions as [`acknowledge`].
    pub(crate) fn fail(
        &mut self,
        id: RegistrationId,
    ) -> Option<(Name, Option<RegisterFailureCallback>)> {
        let entry = self.entries.get_mut(&id)?;
        if entry.state == RegistrationState::Registered
            || entry.state == RegistrationState::Failed
            || entry.unregistering
        {
            return None;
        }
        entry.state = RegistrationState::Failed;
        entry.command = None;
        trace!(%id, prefix = %entry.prefix, "registration failed");
        Some((entry.prefix.clone(), entry.on_failure.take()))
    }

    pub(crate) fn state(&self, id: RegistrationId) -> Option<RegistrationState> {
        self.entries.get(&id).map(|entry| entry.state)
    }

    /// Begin unregistering. Marks the record, parks the outcome
    /// callbacks, and drops the register callbacks so they can never fire
    /// after the unregistration completes.
    pub(crate) fn begin_unregister(
        &mut self,
        id: RegistrationId,
        on_success: Option<UnregisterSuccessCallback>,
        on_failure: Option<UnregisterFailureCallback>,
    ) -> UnregisterStart {
        let Some(entry) = self.entries.get_mut(&id) else {
            return UnregisterStart::NotFound { on_failure };
        };
        if entry.unregistering {
            return UnregisterStart::AlreadyInProgress { on_failure };
        }
        if entry.state == RegistrationState::Failed {
            trace!(%id, "failed registration removed locally");
            self.entries.remove(&id);
            return UnregisterStart::LocalOnly { on_success };
        }
        entry.unregistering = true;
        entry.on_success = None;
        entry.on_failure = None;
        entry.on_unregister_success = on_success;
        entry.on_unregister_failure = on_failure;
        UnregisterStart::Command { cancel: entry.command.take() }
    }

    /// The mirror command succeeded: the record is removed for good.
    pub(crate) fn finish_unregister_success(
        &mut self,
        id: RegistrationId,
    ) -> Option<UnregisterSuccessCallback> {
        let entry = self.entries.remove(&id)?;
        trace!(%id, prefix = %entry.prefix, "registration removed");
        entry.on_unregister_success
    }

    /// The mirror command failed: the record stays and may be retried.
    pub(crate) fn finish_unregister_failure(
        &mut self,
        id: RegistrationId,
    ) -> Option<UnregisterFailureCallback> {
        let entry = self.entries.get_mut(&id)?;
        entry.unregistering = false;
        entry.on_unregister_success = None;
        entry.on_unregister_failure.take()
    }

    /// Shutdown path: clear everything without invoking any callback.
    pub(crate) fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
