//! Link abstraction under the face
//!
//! A transport moves opaque encoded blocks. The face owns exactly one
//! transport, injected at construction; it never opens connections on its
//! own. Incoming blocks arrive on a channel the face takes over once with
//! [`Transport::take_receiver`] and pumps from a background task.
//!
//! [`MemoryTransport`] is the in-process implementation used by tests and
//! local wiring.

mod memory;

use std::fmt;

use tokio::sync::mpsc;

pub use memory::MemoryTransport;

/// Errors surfaced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport was closed locally or the peer is gone.
    Closed,
    /// The block could not be handed to the link.
    Send(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport is closed"),
            TransportError::Send(reason) => write!(f, "transport send failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// One bidirectional link carrying encoded blocks.
pub trait Transport: Send + 'static {
    /// Queue one encoded block for the peer.
    fn send(&mut self, block: Vec<u8>) -> Result<(), TransportError>;

    /// Hand over the incoming-block channel. Returns `Some` exactly once;
    /// the caller owns the receiver afterwards.
    fn take_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<u8>>>;

    /// True while the link can still carry blocks.
    fn is_connected(&self) -> bool;

    /// Close the link. Idempotent.
    fn close(&mut self);
}
