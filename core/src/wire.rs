//! Link-layer envelope codec
//!
//! Every block crossing the transport is one postcard-encoded
//! [`LpEnvelope`]: a network-layer packet fragment plus optional
//! link-layer fields (Nack reason, face ids, congestion mark, hop count).
//! A Nack has no encoding of its own — it is an envelope whose `nack`
//! field is set around an Interest fragment.
//!
//! The codec is confined to this module; the rest of the crate handles
//! decoded, typed values only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::packet::{Data, Interest, Name, NackReason, PacketKind};

/// Outer envelope wrapping every block on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LpEnvelope {
    /// Encoded network-layer packet ([`NetPacket`]).
    pub fragment: Vec<u8>,
    /// Present when the fragment is a nacked Interest.
    pub nack: Option<NackReason>,
    /// Id of the face the packet arrived on, stamped by the forwarder.
    pub incoming_face_id: Option<u64>,
    /// Requested outgoing face, honored by the forwarder.
    pub next_hop_face_id: Option<u64>,
    /// Congestion mark, copied verbatim across hops.
    pub congestion_mark: Option<u64>,
    /// Hops travelled before reaching this face.
    pub hop_count: Option<u64>,
}

impl LpEnvelope {
    /// Envelope carrying just a fragment, all link-layer fields absent.
    pub fn for_fragment(fragment: Vec<u8>) -> Self {
        LpEnvelope {
            fragment,
            ..LpEnvelope::default()
        }
    }
}

/// Network-layer packet inside an envelope fragment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NetPacket {
    Interest(Interest),
    Data(Data),
}

impl NetPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            NetPacket::Interest(_) => PacketKind::Interest,
            NetPacket::Data(_) => PacketKind::Data,
        }
    }

    pub fn name(&self) -> &Name {
        match self {
            NetPacket::Interest(interest) => &interest.name,
            NetPacket::Data(data) => &data.name,
        }
    }
}

/// Errors produced by the envelope codec.
#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    /// Serialization failed.
    Encode(String),
    /// The block could not be parsed.
    Decode(String),
    /// The block parsed but left unconsumed bytes.
    TrailingBytes(usize),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Encode(reason) => write!(f, "failed to encode block: {reason}"),
            WireError::Decode(reason) => write!(f, "failed to decode block: {reason}"),
            WireError::TrailingBytes(n) => {
                write!(f, "block has {n} trailing bytes after the envelope")
            }
        }
    }
}

impl std::error::Error for WireError {}

/// Encode a network-layer packet into envelope-fragment bytes.
pub fn encode_packet(packet: &NetPacket) -> Result<Vec<u8>, WireError> {
    postcard::to_stdvec(packet).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decode an envelope fragment into a network-layer packet.
pub fn decode_packet(fragment: &[u8]) -> Result<NetPacket, WireError> {
    postcard::from_bytes(fragment).map_err(|e| WireError::Decode(e.to_string()))
}

/// Encode an envelope into a transport block.
pub fn encode_envelope(envelope: &LpEnvelope) -> Result<Vec<u8>, WireError> {
    postcard::to_stdvec(envelope).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decode a transport block into an envelope. The block must contain
/// exactly one envelope; trailing bytes are an error.
pub fn decode_envelope(block: &[u8]) -> Result<LpEnvelope, WireError> {
    let (envelope, rest) = postcard::take_from_bytes::<LpEnvelope>(block)
        .map_err(|e| WireError::Decode(e.to_string()))?;
    if !rest.is_empty() {
        return Err(WireError::TrailingBytes(rest.len()));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Interest;

    fn interest_fragment(uri: &str) -> Vec<u8> {
        encode_packet(&NetPacket::Interest(Interest::new(uri).with_nonce(9))).unwrap()
    }

    // ========== Round trips ==========

    #[test]
    fn envelope_round_trips_all_fields() {
        let envelope = LpEnvelope {
            fragment: interest_fragment("/a"),
            nack: Some(NackReason::Congestion),
            incoming_face_id: Some(12),
            next_hop_face_id: Some(3),
            congestion_mark: Some(1),
            hop_count: Some(4),
        };
        let block = encode_envelope(&envelope).unwrap();
        assert_eq!(decode_envelope(&block).unwrap(), envelope);
    }

    #[test]
    fn bare_fragment_envelope_round_trips() {
        let envelope = LpEnvelope::for_fragment(interest_fragment("/a/b"));
        let block = encode_envelope(&envelope).unwrap();
        let decoded = decode_envelope(&block).unwrap();
        assert_eq!(decoded.nack, None);
        assert_eq!(decoded.hop_count, None);
        let packet = decode_packet(&decoded.fragment).unwrap();
        assert_eq!(packet.kind(), PacketKind::Interest);
        assert_eq!(packet.name(), &Name::from("/a/b"));
    }

    #[test]
    fn data_packet_round_trips() {
        let fragment = encode_packet(&NetPacket::Data(Data::new("/d", vec![1, 2, 3]))).unwrap();
        match decode_packet(&fragment).unwrap() {
            NetPacket::Data(data) => assert_eq!(data.payload, vec![1, 2, 3]),
            other => panic!("expected data, got {other:?}"),
        }
    }

    // ========== Error cases ==========

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut block = encode_envelope(&LpEnvelope::for_fragment(vec![])).unwrap();
        block.extend_from_slice(&[0xaa, 0xbb]);
        assert_eq!(decode_envelope(&block), Err(WireError::TrailingBytes(2)));
    }

    #[test]
    fn garbage_fragment_fails_to_decode() {
        let err = decode_packet(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, WireError::Decode(_)));
        assert!(err.to_string().contains("failed to decode block"));
    }

    #[test]
    fn empty_block_fails_to_decode() {
        assert!(matches!(decode_envelope(&[]), Err(WireError::Decode(_))));
    }
}
