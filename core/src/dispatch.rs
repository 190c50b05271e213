//! Packet dispatch
//!
//! The seam between raw transport blocks and the face's tables.
//! [`classify`] turns one inbound block into exactly one typed packet:
//! size and decode checks first, then the Nack header decides the kind.
//! An envelope with a Nack header is a Nack and nothing else — the
//! Interest it carries is never dispatched on its own. Link-layer fields
//! become packet tags here; hop count is incremented only when the
//! envelope carried one.
//!
//! [`encode_outbound`] is the reverse seam: packet to block, outbound
//! tags copied into the envelope, size limit enforced before anything
//! reaches the transport.

use tracing::{debug, trace};

use crate::face::core::FaceCore;
use crate::face::FaceError;
use crate::packet::{Data, Interest, Nack, NackReason, PacketKind, PacketTags};
use crate::wire::{decode_envelope, decode_packet, encode_envelope, encode_packet, LpEnvelope, NetPacket};

/// One inbound packet, classified and tagged.
#[derive(Debug)]
pub(crate) enum Classified {
    Interest(Interest),
    Data(Data),
    Nack(Nack),
}

/// Decode one inbound block into a classified packet.
///
/// The inner packet's encoded size is checked against `limit`; an
/// oversized packet is an [`FaceError::OversizedPacket`] naming its kind,
/// name, and exact size rather than a silent drop. A Nack header around
/// anything but an Interest fragment is malformed.
pub(crate) fn classify(block: &[u8], limit: usize) -> Result<Classified, FaceError> {
    let envelope = decode_envelope(block)?;
    let packet = decode_packet(&envelope.fragment)?;

    if envelope.fragment.len() > limit {
        let kind = match (&packet, envelope.nack) {
            (NetPacket::Interest(_), Some(_)) => PacketKind::Nack,
            _ => packet.kind(),
        };
        return Err(FaceError::OversizedPacket {
            kind,
            name: packet.name().clone(),
            size: envelope.fragment.len(),
            limit,
        });
    }

    let tags = PacketTags {
        incoming_face_id: envelope.incoming_face_id,
        next_hop_face_id: None,
        congestion_mark: envelope.congestion_mark,
        // Incremented only when present; an absent count stays absent.
        hop_count: envelope.hop_count.map(|hops| hops + 1),
    };

    match (packet, envelope.nack) {
        (NetPacket::Interest(interest), Some(reason)) => {
            let mut nack = Nack::new(interest, reason);
            nack.tags = tags;
            Ok(Classified::Nack(nack))
        }
        (NetPacket::Data(data), Some(_)) => Err(FaceError::Decode(format!(
            "nack header on a data fragment ({})",
            data.name
        ))),
        (NetPacket::Interest(mut interest), None) => {
            interest.tags = tags;
            Ok(Classified::Interest(interest))
        }
        (NetPacket::Data(mut data), None) => {
            data.tags = tags;
            Ok(Classified::Data(data))
        }
    }
}

/// Encode one outbound packet into a transport block.
///
/// `nack` wraps the packet (which must then be the nacked Interest) in a
/// Nack envelope. `tags` supplies the outbound link-layer fields: the
/// congestion mark is copied for every kind, the next-hop face id only
/// for plain Interests. Enforces `limit` on the encoded block.
pub(crate) fn encode_outbound(
    packet: NetPacket,
    nack: Option<NackReason>,
    tags: &PacketTags,
    limit: usize,
) -> Result<Vec<u8>, FaceError> {
    let kind = if nack.is_some() { PacketKind::Nack } else { packet.kind() };
    let name = packet.name().clone();

    let fragment = encode_packet(&packet)?;
    let mut envelope = LpEnvelope::for_fragment(fragment);
    envelope.nack = nack;
    envelope.congestion_mark = tags.congestion_mark;
    if kind == PacketKind::Interest {
        envelope.next_hop_face_id = tags.next_hop_face_id;
    }

    let block = encode_envelope(&envelope)?;
    if block.len() > limit {
        return Err(FaceError::OversizedPacket { kind, name, size: block.len(), limit });
    }
    Ok(block)
}

impl FaceCore {
    /// Deliver one classified packet to its table. Runs inside the
    /// executor; all callbacks fire from here.
    pub(crate) fn route(&mut self, packet: Classified) {
        match packet {
            Classified::Interest(interest) => {
                debug!(name = %interest.name, "< Interest");
                let fired = self.filters.dispatch(&interest);
                if fired == 0 {
                    trace!(name = %interest.name, "interest matched no filter");
                }
            }
            Classified::Data(data) => {
                debug!(name = %data.name, "< Data");
                let satisfied = self.requests.satisfy(&data);
                if satisfied == 0 {
                    trace!(name = %data.name, "unsolicited data");
                }
            }
            Classified::Nack(nack) => {
                debug!(name = %nack.interest.name, reason = %nack.reason, "< Nack");
                let resolved = self.requests.nack(&nack);
                if resolved == 0 {
                    trace!(name = %nack.interest.name, "stale nack");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::MAX_PACKET_SIZE;

    fn block_for(packet: NetPacket) -> Vec<u8> {
        encode_outbound(packet, None, &PacketTags::default(), MAX_PACKET_SIZE).unwrap()
    }

    // ========== Classification ==========

    #[test]
    fn test_classifies_plain_interest() {
        let block = block_for(NetPacket::Interest(Interest::new("/a/b")));
        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Interest(interest) => assert_eq!(interest.name.to_string(), "/a/b"),
            other => panic!("expected interest, got {:?}", other),
        }
    }

    #[test]
    fn test_classifies_plain_data() {
        let block = block_for(NetPacket::Data(Data::new("/a/b", b"payload".to_vec())));
        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Data(data) => assert_eq!(data.payload, b"payload"),
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn test_nack_header_wins_over_interest() {
        // An envelope carrying both a Nack header and an Interest fragment
        // is one Nack, never an Interest as well.
        let interest = Interest::new("/a").with_nonce(7);
        let block = encode_outbound(
            NetPacket::Interest(interest),
            Some(NackReason::Congestion),
            &PacketTags::default(),
            MAX_PACKET_SIZE,
        )
        .unwrap();

        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Nack(nack) => {
                assert_eq!(nack.reason, NackReason::Congestion);
                assert_eq!(nack.interest.nonce, Some(7));
            }
            other => panic!("expected nack, got {:?}", other),
        }
    }

    #[test]
    fn test_nack_header_on_data_is_malformed() {
        let fragment = encode_packet(&NetPacket::Data(Data::new("/a", Vec::new()))).unwrap();
        let mut envelope = LpEnvelope::for_fragment(fragment);
        envelope.nack = Some(NackReason::NoRoute);
        let block = encode_envelope(&envelope).unwrap();

        let err = classify(&block, MAX_PACKET_SIZE).unwrap_err();
        assert!(matches!(err, FaceError::Decode(_)));
    }

    #[test]
    fn test_one_octet_over_the_limit_is_oversized() {
        let fragment = encode_packet(&NetPacket::Data(Data::new("/big", vec![0u8; 100]))).unwrap();
        let block = encode_envelope(&LpEnvelope::for_fragment(fragment.clone())).unwrap();

        let err = classify(&block, fragment.len() - 1).unwrap_err();
        match err {
            FaceError::OversizedPacket { kind, name, size, limit } => {
                assert_eq!(kind, PacketKind::Data);
                assert_eq!(name.to_string(), "/big");
                assert_eq!(size, fragment.len());
                assert_eq!(limit, fragment.len() - 1);
            }
            other => panic!("expected oversize error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_nacked_interest_reports_nack_kind() {
        let fragment =
            encode_packet(&NetPacket::Interest(Interest::new("/big").with_nonce(1))).unwrap();
        let mut envelope = LpEnvelope::for_fragment(fragment.clone());
        envelope.nack = Some(NackReason::Congestion);
        let block = encode_envelope(&envelope).unwrap();

        match classify(&block, fragment.len() - 1).unwrap_err() {
            FaceError::OversizedPacket { kind, .. } => assert_eq!(kind, PacketKind::Nack),
            other => panic!("expected oversize error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_garbage_blocks() {
        assert!(classify(&[0xff, 0xff, 0xff], MAX_PACKET_SIZE).is_err());
        assert!(classify(&[], MAX_PACKET_SIZE).is_err());
    }

    // ========== Tag extraction ==========

    #[test]
    fn test_link_fields_become_tags() {
        let fragment = encode_packet(&NetPacket::Data(Data::new("/a", Vec::new()))).unwrap();
        let mut envelope = LpEnvelope::for_fragment(fragment);
        envelope.incoming_face_id = Some(12);
        envelope.congestion_mark = Some(1);
        envelope.hop_count = Some(3);
        let block = encode_envelope(&envelope).unwrap();

        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Data(data) => {
                assert_eq!(data.tags.incoming_face_id, Some(12));
                assert_eq!(data.tags.congestion_mark, Some(1));
                assert_eq!(data.tags.hop_count, Some(4));
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_hop_count_stays_absent() {
        let block = block_for(NetPacket::Interest(Interest::new("/a")));
        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Interest(interest) => assert_eq!(interest.tags.hop_count, None),
            other => panic!("expected interest, got {:?}", other),
        }
    }

    #[test]
    fn test_nack_tags_land_on_the_nack() {
        let fragment =
            encode_packet(&NetPacket::Interest(Interest::new("/a").with_nonce(1))).unwrap();
        let mut envelope = LpEnvelope::for_fragment(fragment);
        envelope.nack = Some(NackReason::Duplicate);
        envelope.congestion_mark = Some(2);
        let block = encode_envelope(&envelope).unwrap();

        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Nack(nack) => {
                assert_eq!(nack.tags.congestion_mark, Some(2));
                // The carried interest keeps its own (empty) tags.
                assert_eq!(nack.interest.tags, PacketTags::default());
            }
            other => panic!("expected nack, got {:?}", other),
        }
    }

    // ========== Outbound encoding ==========

    #[test]
    fn test_outbound_size_limit_is_exact() {
        let interest = Interest::new("/tight");
        let fits =
            encode_outbound(NetPacket::Interest(interest.clone()), None, &PacketTags::default(), MAX_PACKET_SIZE)
                .unwrap();

        // One octet under the encoded size must fail, reporting kind,
        // exact size, and the limit.
        let err = encode_outbound(
            NetPacket::Interest(interest),
            None,
            &PacketTags::default(),
            fits.len() - 1,
        )
        .unwrap_err();
        match err {
            FaceError::OversizedPacket { kind, name, size, limit } => {
                assert_eq!(kind, PacketKind::Interest);
                assert_eq!(name.to_string(), "/tight");
                assert_eq!(size, fits.len());
                assert_eq!(limit, fits.len() - 1);
            }
            other => panic!("expected oversize error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_nack_reports_nack_kind() {
        let err = encode_outbound(
            NetPacket::Interest(Interest::new("/a")),
            Some(NackReason::NoRoute),
            &PacketTags::default(),
            1,
        )
        .unwrap_err();
        match err {
            FaceError::OversizedPacket { kind, .. } => assert_eq!(kind, PacketKind::Nack),
            other => panic!("expected oversize error, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_congestion_mark_rides_the_envelope() {
        let mut data = Data::new("/a", Vec::new());
        data.tags.congestion_mark = Some(9);
        let tags = data.tags.clone();
        let block = encode_outbound(NetPacket::Data(data), None, &tags, MAX_PACKET_SIZE).unwrap();

        let envelope = decode_envelope(&block).unwrap();
        assert_eq!(envelope.congestion_mark, Some(9));
    }

    #[test]
    fn test_next_hop_rides_only_on_interests() {
        let mut tags = PacketTags::default();
        tags.next_hop_face_id = Some(4);

        let interest_block = encode_outbound(
            NetPacket::Interest(Interest::new("/a")),
            None,
            &tags,
            MAX_PACKET_SIZE,
        )
        .unwrap();
        assert_eq!(decode_envelope(&interest_block).unwrap().next_hop_face_id, Some(4));

        let data_block =
            encode_outbound(NetPacket::Data(Data::new("/a", Vec::new())), None, &tags, MAX_PACKET_SIZE)
                .unwrap();
        assert_eq!(decode_envelope(&data_block).unwrap().next_hop_face_id, None);

        // A Nack carries an Interest fragment but is not a plain Interest.
        let nack_block = encode_outbound(
            NetPacket::Interest(Interest::new("/a")),
            Some(NackReason::Congestion),
            &tags,
            MAX_PACKET_SIZE,
        )
        .unwrap();
        assert_eq!(decode_envelope(&nack_block).unwrap().next_hop_face_id, None);
    }

    #[test]
    fn test_outbound_then_classify_round_trips() {
        let interest = Interest::new("/round/trip").with_nonce(42).with_can_be_prefix(true);
        let block = block_for(NetPacket::Interest(interest.clone()));
        match classify(&block, MAX_PACKET_SIZE).unwrap() {
            Classified::Interest(decoded) => {
                assert_eq!(decoded.name, interest.name);
                assert_eq!(decoded.nonce, Some(42));
                assert!(decoded.can_be_prefix);
            }
            other => panic!("expected interest, got {:?}", other),
        }
    }
}
