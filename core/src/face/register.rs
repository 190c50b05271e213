//! Prefix-registration command flow
//!
//! Registration rides the face's own request path: the command is an
//! Interest under the configured command prefix, signed by the injected
//! signer, and the forwarder's acknowledgement is a Data named like the
//! command whose payload is a control response. The request callbacks
//! re-enter the executor through weak posts, so a face torn down while a
//! command is in flight drops the transition silently.

use tracing::{debug, warn};

use crate::control::{build_command_name, ControlParameters, ControlVerb, RegistrationOptions, SigningInfo};
use crate::dispatch::encode_outbound;
use crate::packet::{Interest, NackReason, Name, PacketTags};
use crate::tables::registrations::UnregisterStart;
use crate::tables::{RegistrationId, RequestId};
use crate::wire::NetPacket;

use super::core::FaceCore;
use super::{
    RegisterFailureCallback, RegisterSuccessCallback, UnregisterFailureCallback,
    UnregisterSuccessCallback,
};

/// How a command's request resolved, carried back into the executor.
pub(crate) enum CommandOutcome {
    Response(Vec<u8>),
    Nacked(NackReason),
    TimedOut,
}

impl FaceCore {
    /// Record a registration and send its signed command.
    pub(crate) fn start_registration(
        &mut self,
        id: RegistrationId,
        prefix: impl Into<Name>,
        options: RegistrationOptions,
        signing: SigningInfo,
        on_success: Option<RegisterSuccessCallback>,
        on_failure: Option<RegisterFailureCallback>,
    ) {
        let prefix = prefix.into();
        self.registrations.insert(id, prefix, options, signing, on_success, on_failure);
        match self.send_command(id, ControlVerb::Register, FaceCore::complete_registration) {
            Ok(request) => self.registrations.command_sent(id, request),
            Err(reason) => self.fail_registration(id, &reason),
        }
    }

    /// The register command's request resolved.
    pub(crate) fn complete_registration(&mut self, id: RegistrationId, outcome: CommandOutcome) {
        match self.command_result(outcome) {
            Ok(()) => {
                if let Some((prefix, on_success)) = self.registrations.acknowledge(id) {
                    debug!(%id, %prefix, "prefix registered");
                    if let Some(on_success) = on_success {
                        on_success(&prefix);
                    }
                }
            }
            Err(reason) => self.fail_registration(id, &reason),
        }
    }

    fn fail_registration(&mut self, id: RegistrationId, reason: &str) {
        if let Some((prefix, on_failure)) = self.registrations.fail(id) {
            warn!(%id, %prefix, reason, "prefix registration failed");
            if let Some(on_failure) = on_failure {
                on_failure(&prefix, reason);
            }
        }
    }

    /// Begin unregistering, cancelling a still-pending register command
    /// first so its success can never fire afterwards.
    pub(crate) fn start_unregistration(
        &mut self,
        id: RegistrationId,
        on_success: Option<UnregisterSuccessCallback>,
        on_failure: Option<UnregisterFailureCallback>,
    ) {
        match self.registrations.begin_unregister(id, on_success, on_failure) {
            UnregisterStart::NotFound { on_failure } => {
                if let Some(on_failure) = on_failure {
                    on_failure("no such registration");
                }
            }
            UnregisterStart::AlreadyInProgress { on_failure } => {
                if let Some(on_failure) = on_failure {
                    on_failure("unregistration already in progress");
                }
            }
            UnregisterStart::LocalOnly { on_success } => {
                if let Some(on_success) = on_success {
                    on_success();
                }
            }
            UnregisterStart::Command { cancel } => {
                if let Some(request) = cancel {
                    self.requests.remove(request);
                }
                match self.send_command(id, ControlVerb::Unregister, FaceCore::complete_unregistration) {
                    Ok(_) => {}
                    Err(reason) => {
                        if let Some(on_failure) = self.registrations.finish_unregister_failure(id) {
                            on_failure(&reason);
                        }
                    }
                }
            }
        }
    }

    /// The unregister command's request resolved.
    pub(crate) fn complete_unregistration(&mut self, id: RegistrationId, outcome: CommandOutcome) {
        match self.command_result(outcome) {
            Ok(()) => {
                debug!(%id, "prefix unregistered");
                if let Some(on_success) = self.registrations.finish_unregister_success(id) {
                    on_success();
                }
            }
            Err(reason) => {
                warn!(%id, reason, "prefix unregistration failed");
                if let Some(on_failure) = self.registrations.finish_unregister_failure(id) {
                    on_failure(&reason);
                }
            }
        }
    }

    /// Build, sign, send, and express one command for registration `id`.
    ///
    /// `complete` is re-entered through a weak post when the request
    /// resolves; nothing fires if the face is gone by then.
    fn send_command(
        &mut self,
        id: RegistrationId,
        verb: ControlVerb,
        complete: fn(&mut FaceCore, RegistrationId, CommandOutcome),
    ) -> Result<RequestId, String> {
        let (prefix, options, signing) = self
            .registrations
            .command_context(id)
            .ok_or_else(|| String::from("no such registration"))?;
        let params = ControlParameters::for_registration(prefix, &options);
        self.command_seq += 1;
        let name = build_command_name(
            &self.config.command_prefix,
            verb,
            &params,
            self.command_seq,
            self.signer.as_ref(),
            &signing,
        )
        .map_err(|e| e.to_string())?;

        let interest = Interest::new(name)
            .with_lifetime(self.config.command_timeout)
            .with_nonce(rand::random());
        let block = encode_outbound(
            NetPacket::Interest(interest.clone()),
            None,
            &PacketTags::default(),
            self.config.max_packet_size,
        )
        .map_err(|e| e.to_string())?;
        // A send failure fails the command immediately; nothing has been
        // recorded yet at that point.
        self.transport.send(block).map_err(|e| e.to_string())?;

        let request = self.requests.allocate();
        let timer = self
            .executor
            .schedule(interest.lifetime, move |core| core.requests.timeout(request));
        let (on_data, on_nack, on_timeout) =
            (self.executor.clone(), self.executor.clone(), self.executor.clone());
        debug!(%id, %verb, command = %interest.name, "command sent");
        self.requests.express(
            request,
            interest,
            Box::new(move |_, data| {
                let payload = data.payload.clone();
                on_data.post(move |core| complete(core, id, CommandOutcome::Response(payload)));
            }),
            Box::new(move |_, nack| {
                let reason = nack.reason;
                on_nack.post(move |core| complete(core, id, CommandOutcome::Nacked(reason)));
            }),
            Box::new(move |_| {
                on_timeout.post(move |core| complete(core, id, CommandOutcome::TimedOut));
            }),
            timer,
        );
        Ok(request)
    }

    /// Fold a command outcome into success or a descriptive reason.
    fn command_result(&self, outcome: CommandOutcome) -> Result<(), String> {
        match outcome {
            CommandOutcome::Response(payload) => {
                let response = self.signer.parse_response(&payload).map_err(|e| e.to_string())?;
                if response.is_success() {
                    Ok(())
                } else {
                    Err(format!(
                        "forwarder refused the command: {} {}",
                        response.code, response.text
                    ))
                }
            }
            CommandOutcome::Nacked(reason) => Err(format!("command nacked: {reason}")),
            CommandOutcome::TimedOut => Err(String::from("command timed out")),
        }
    }
}
