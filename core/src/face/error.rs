//! Face errors

use std::fmt;

use crate::packet::{Name, PacketKind};
use crate::wire::WireError;

/// Errors surfaced by face operations.
#[derive(Debug)]
pub enum FaceError {
    /// An outbound packet's encoding exceeds the size limit.
    OversizedPacket {
        kind: PacketKind,
        name: Name,
        size: usize,
        limit: usize,
    },
    /// An outbound packet could not be encoded.
    Encode(String),
    /// An inbound block could not be decoded or is oversized.
    Decode(String),
    /// The face has been shut down.
    Shutdown,
}

impl fmt::Display for FaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceError::OversizedPacket { kind, name, size, limit } => write!(
                f,
                "{} {} encodes into {} octets, exceeding the limit of {} octets",
                kind, name, size, limit
            ),
            FaceError::Encode(e) => write!(f, "encode error: {}", e),
            FaceError::Decode(e) => write!(f, "decode error: {}", e),
            FaceError::Shutdown => write!(f, "face has been shut down"),
        }
    }
}

impl std::error::Error for FaceError {}

impl From<WireError> for FaceError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Encode(reason) => FaceError::Encode(reason),
            other => FaceError::Decode(other.to_string()),
        }
    }
}
