//! Public face operations
//!
//! Thin layer over the executor: each operation validates and encodes on
//! the caller's thread, allocates its record id up front, then posts one
//! task that mutates the tables and talks to the transport. Callbacks
//! always fire on the face's own logical thread.

use crate::dispatch::{classify, encode_outbound};
use crate::packet::{Data, Interest, InterestFilter, Nack, Name};
use crate::tables::{FilterId, RegistrationId, RequestId};
use crate::wire::NetPacket;

use super::core::Face;
use super::error::FaceError;
use super::handle::{InterestFilterHandle, PendingInterestHandle, RegisteredPrefixHandle};
use crate::control::{RegistrationOptions, SigningInfo};

impl Face {
    // ========== Request API ==========

    /// Express an Interest and wait for the outcome through callbacks.
    ///
    /// Exactly one of `on_data`, `on_nack`, `on_timeout` fires, unless the
    /// request is cancelled or the face shuts down first, in which case
    /// none does. A nonce is assigned if the Interest has none. The
    /// encoded packet is checked against the size limit before anything is
    /// sent; an oversized Interest is reported synchronously.
    pub fn express_interest(
        &self,
        interest: Interest,
        on_data: impl FnOnce(&Interest, &Data) + Send + 'static,
        on_nack: impl FnOnce(&Interest, &Nack) + Send + 'static,
        on_timeout: impl FnOnce(&Interest) + Send + 'static,
    ) -> Result<PendingInterestHandle, FaceError> {
        self.check_running()?;
        let mut interest = interest;
        if interest.nonce.is_none() {
            interest.nonce = Some(rand::random());
        }
        let block = encode_outbound(
            NetPacket::Interest(interest.clone()),
            None,
            &interest.tags,
            self.config.max_packet_size,
        )?;

        let id = RequestId(self.ids.requests.next());
        let (on_data, on_nack, on_timeout): (super::DataCallback, super::NackCallback, super::TimeoutCallback) =
            (Box::new(on_data), Box::new(on_nack), Box::new(on_timeout));
        self.executor.post(move |core| {
            // The timeout rides the scheduler even when the lifetime is
            // zero, so it can never fire inline with the expression.
            let timer = core
                .executor
                .schedule(interest.lifetime, move |core| core.requests.timeout(id));
            core.requests.express(id, interest, on_data, on_nack, on_timeout, timer);
            core.send_block(block);
        });
        Ok(PendingInterestHandle::new(self.executor.downgrade(), id))
    }

    /// Withdraw every pending request without firing any callback.
    pub fn remove_all_pending_interests(&self) {
        self.executor.post(|core| core.requests.remove_all());
    }

    // ========== Producer API ==========

    /// Send a Data packet, typically answering an Interest delivered to a
    /// filter. Outbound tags on the packet ride the envelope.
    pub fn put_data(&self, data: Data) -> Result<(), FaceError> {
        self.check_running()?;
        let tags = data.tags.clone();
        let block =
            encode_outbound(NetPacket::Data(data), None, &tags, self.config.max_packet_size)?;
        self.executor.post(move |core| core.send_block(block));
        Ok(())
    }

    /// Send a Nack refusing an Interest delivered to a filter.
    pub fn put_nack(&self, nack: Nack) -> Result<(), FaceError> {
        self.check_running()?;
        let tags = nack.tags.clone();
        let block = encode_outbound(
            NetPacket::Interest(nack.interest),
            Some(nack.reason),
            &tags,
            self.config.max_packet_size,
        )?;
        self.executor.post(move |core| core.send_block(block));
        Ok(())
    }

    // ========== Filter API ==========

    /// Subscribe to inbound Interests under a prefix, locally only — the
    /// forwarding layer is not told. The filter stays set until its
    /// handle cancels it or the face shuts down.
    pub fn set_interest_filter(
        &self,
        filter: impl Into<InterestFilter>,
        on_interest: impl FnMut(&InterestFilter, &Interest) + Send + 'static,
    ) -> InterestFilterHandle {
        let filter = filter.into();
        let id = FilterId(self.ids.filters.next());
        let on_interest: super::InterestCallback = Box::new(on_interest);
        self.executor.post(move |core| core.filters.set_filter(id, filter, on_interest));
        InterestFilterHandle::new(self.executor.downgrade(), id)
    }

    // ========== Registration API ==========

    /// Ask the forwarding layer to deliver Interests under `prefix` to
    /// this face.
    ///
    /// The outcome arrives through `on_success` or `on_failure`; a face
    /// shut down before the command resolves reports neither. No filter
    /// is installed: pair this with [`set_interest_filter`] or use
    /// [`register_interest_filter`] to do both.
    ///
    /// [`set_interest_filter`]: Face::set_interest_filter
    /// [`register_interest_filter`]: Face::register_interest_filter
    pub fn register_prefix(
        &self,
        prefix: impl Into<Name>,
        options: RegistrationOptions,
        signing: SigningInfo,
        on_success: impl FnOnce(&Name) + Send + 'static,
        on_failure: impl FnOnce(&Name, &str) + Send + 'static,
    ) -> RegisteredPrefixHandle {
        let prefix = prefix.into();
        let id = RegistrationId(self.ids.registrations.next());
        let on_success: super::RegisterSuccessCallback = Box::new(on_success);
        let on_failure: super::RegisterFailureCallback = Box::new(on_failure);
        self.executor.post(move |core| {
            core.start_registration(id, prefix, options, signing, Some(on_success), Some(on_failure));
        });
        RegisteredPrefixHandle::new(self.executor.downgrade(), id)
    }

    /// Install a filter and register its prefix in one call.
    ///
    /// Returns both handles: filter lifetime and registration lifetime
    /// are independent, so a failed or later-unregistered registration
    /// leaves the filter in place until its own handle clears it.
    pub fn register_interest_filter(
        &self,
        filter: impl Into<InterestFilter>,
        on_interest: impl FnMut(&InterestFilter, &Interest) + Send + 'static,
        options: RegistrationOptions,
        signing: SigningInfo,
        on_success: impl FnOnce(&Name) + Send + 'static,
        on_failure: impl FnOnce(&Name, &str) + Send + 'static,
    ) -> (RegisteredPrefixHandle, InterestFilterHandle) {
        let filter = filter.into();
        let prefix = filter.prefix().clone();
        let filter_handle = self.set_interest_filter(filter, on_interest);
        let prefix_handle = self.register_prefix(prefix, options, signing, on_success, on_failure);
        (prefix_handle, filter_handle)
    }

    // ========== Inbound API ==========

    /// Feed one raw block into the face as if the transport delivered it.
    ///
    /// Classification runs on the caller's thread, so decode failures and
    /// oversized packets come back synchronously; routing and callback
    /// invocation happen on the face's own thread.
    pub fn on_receive_element(&self, block: &[u8]) -> Result<(), FaceError> {
        self.check_running()?;
        let packet = classify(block, self.config.max_packet_size)?;
        self.executor.post(move |core| core.route(packet));
        Ok(())
    }

    // ========== Counters ==========

    /// Number of requests still awaiting Data, a Nack, or their timeout.
    /// Zero once the face has shut down.
    pub async fn pending_interest_count(&self) -> usize {
        self.query(|core| core.requests.len()).await.unwrap_or(0)
    }

    /// Number of Interest filters currently set.
    pub async fn interest_filter_count(&self) -> usize {
        self.query(|core| core.filters.len()).await.unwrap_or(0)
    }

    /// Number of prefix registrations currently tracked.
    pub async fn registered_prefix_count(&self) -> usize {
        self.query(|core| core.registrations.len()).await.unwrap_or(0)
    }
}
