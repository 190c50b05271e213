//! Face - the application's endpoint onto the network
//!
//! A face sends Interests and Data over one transport and delivers the
//! responses back through callbacks. All shared state lives behind a
//! deferred executor, so callbacks always run on the face's own logical
//! thread and never race the caller.
//!
//! # Module Structure
//!
//! - `core.rs`: Face struct, construction, shutdown, counters
//! - `api.rs`: Face operations (express, put, filters, registration)
//! - `register.rs`: prefix-registration command flow
//! - `config.rs`: FaceConfig builder
//! - `error.rs`: FaceError
//! - `handle.rs`: cancellation handles returned by operations
//!
//! # Quick Start
//!
//! ```ignore
//! use windlass_core::{Face, FaceConfig, KeyedSigner, MemoryTransport};
//! use windlass_core::packet::Interest;
//!
//! let (transport, _peer) = MemoryTransport::pair();
//! let face = Face::new(transport, KeyedSigner::for_testing(), FaceConfig::default());
//!
//! let handle = face.express_interest(
//!     Interest::new("/sensors/room-1/temp"),
//!     |_interest, data| println!("got {} bytes", data.payload.len()),
//!     |_interest, nack| println!("nacked: {}", nack.reason),
//!     |interest| println!("{} timed out", interest.name),
//! )?;
//!
//! face.shutdown().await;
//! ```

mod api;
mod config;
pub(crate) mod core;
mod error;
mod handle;
mod register;

use crate::packet::{Data, Interest, InterestFilter, Nack, Name};

pub use config::FaceConfig;
pub use error::FaceError;
pub use handle::{
    InterestFilterHandle, PendingInterestHandle, RegisteredPrefixHandle,
    ScopedInterestFilterHandle, ScopedPendingInterestHandle, ScopedRegisteredPrefixHandle,
};
pub use self::core::Face;

/// Invoked when a pending request is satisfied by Data.
pub type DataCallback = Box<dyn FnOnce(&Interest, &Data) + Send>;

/// Invoked when a pending request is refused by a Nack.
pub type NackCallback = Box<dyn FnOnce(&Interest, &Nack) + Send>;

/// Invoked when a pending request's lifetime elapses unanswered.
pub type TimeoutCallback = Box<dyn FnOnce(&Interest) + Send>;

/// Invoked for every inbound Interest matching a filter. A filter stays
/// set across invocations, so this one may fire many times.
pub type InterestCallback = Box<dyn FnMut(&InterestFilter, &Interest) + Send>;

/// Invoked once the forwarder accepts a prefix registration.
pub type RegisterSuccessCallback = Box<dyn FnOnce(&Name) + Send>;

/// Invoked when a prefix registration is rejected, times out, or cannot
/// be signed. Carries the prefix and a reason.
pub type RegisterFailureCallback = Box<dyn FnOnce(&Name, &str) + Send>;

/// Invoked once the forwarder accepts an unregistration.
pub type UnregisterSuccessCallback = Box<dyn FnOnce() + Send>;

/// Invoked when an unregistration cannot be carried out.
pub type UnregisterFailureCallback = Box<dyn FnOnce(&str) + Send>;
