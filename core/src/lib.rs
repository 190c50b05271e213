//! Windlass Core
//!
//! Client face for a pull-based, name-addressed data-retrieval protocol.
//!
//! Applications express named requests ("Interests"), receive matching
//! responses ("Data") or negative acknowledgements ("Nacks"), register to
//! serve requests under name prefixes, and exchange encoded packets with
//! an injected transport. All face state lives behind a single-threaded
//! deferred executor, so callbacks are delivered exactly once and never
//! race the caller, even across cancellation and shutdown.
//!
//! # Module Structure
//!
//! - `face/`: Public interface (Face, operations, handles, config, errors)
//! - `executor`: Deferred single-threaded execution with weak re-entry
//! - `tables/`: Pending requests, Interest filters, prefix registrations
//! - `dispatch`: Inbound classification and routing, outbound encoding
//! - `packet/`: Names, Interests, Data, Nacks, link-layer tags
//! - `wire`: Envelope codec (serde + postcard)
//! - `control`: Registration commands and their signing
//! - `transport/`: Transport trait and the in-memory implementation
//! - `testing/`: Scripted-peer harness
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

// Public interface
pub mod face;

// Internal plumbing
pub(crate) mod dispatch;
pub(crate) mod tables;

// Infrastructure modules (pub for flexibility)
pub mod control;
pub mod executor;
pub mod packet;
pub mod testing;
pub mod transport;
pub mod wire;

// Re-export main API types for convenience
pub use control::{
    CommandSigner,
    ControlResponse,
    KeyedSigner,
    RegistrationOptions,
    SigningInfo,
};
pub use face::{
    Face,
    FaceConfig,
    FaceError,
    InterestFilterHandle,
    PendingInterestHandle,
    RegisteredPrefixHandle,
    ScopedInterestFilterHandle,
    ScopedPendingInterestHandle,
    ScopedRegisteredPrefixHandle,
};
pub use packet::{Data, Interest, InterestFilter, Nack, NackReason, Name};
pub use tables::{FilterId, RegistrationId, RequestId};
pub use transport::{MemoryTransport, Transport, TransportError};
