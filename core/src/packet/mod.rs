//! Network-layer packet model
//!
//! Owned, immutable-after-construction packet types exchanged through a
//! face: `Interest` (named request), `Data` (named response), `Nack`
//! (negative acknowledgement keyed to an Interest's nonce). Packets carry
//! a non-wire [`PacketTags`] block holding link-layer metadata extracted
//! from, or destined for, the envelope.

pub mod name;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use name::{InterestFilter, Name};

/// Hard upper bound on the encoded size of a network-layer packet, in
/// octets. Applies to both directions.
pub const MAX_PACKET_SIZE: usize = 8800;

/// Lifetime assigned to an Interest when the application does not choose
/// one.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_millis(4000);

/// Link-layer metadata attached to packets crossing the face.
///
/// Not part of the packet wire encoding: inbound values are extracted from
/// the envelope by the dispatcher, outbound values are copied into the
/// envelope by the send path. `hop_count` is only ever present if the
/// envelope carried one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketTags {
    /// Id of the remote face the packet arrived on (inbound only).
    pub incoming_face_id: Option<u64>,
    /// Requested outgoing face at the forwarder (outbound Interests only).
    pub next_hop_face_id: Option<u64>,
    /// Congestion mark, copied verbatim in both directions.
    pub congestion_mark: Option<u64>,
    /// Hops travelled so far, incremented once per face crossing.
    pub hop_count: Option<u64>,
}

/// A named request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    /// Selector: accept Data whose name extends this Interest's name.
    pub can_be_prefix: bool,
    /// Selector: only fresh Data should satisfy this Interest. Carried on
    /// the wire for the forwarder; not consulted in client-side matching.
    pub must_be_fresh: bool,
    /// Correlation nonce; assigned by the face on expression if absent.
    pub nonce: Option<u32>,
    /// How long the request stays pending before timing out.
    pub lifetime: Duration,
    #[serde(skip)]
    pub tags: PacketTags,
}

impl Interest {
    pub fn new(name: impl Into<Name>) -> Self {
        Interest {
            name: name.into(),
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: None,
            lifetime: DEFAULT_INTEREST_LIFETIME,
            tags: PacketTags::default(),
        }
    }

    pub fn with_can_be_prefix(mut self, value: bool) -> Self {
        self.can_be_prefix = value;
        self
    }

    pub fn with_must_be_fresh(mut self, value: bool) -> Self {
        self.must_be_fresh = value;
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// True if `data` satisfies this Interest: exact name match, or prefix
    /// match when `can_be_prefix` is set.
    pub fn matches_data(&self, data: &Data) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }
}

/// A named response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub payload: Vec<u8>,
    #[serde(skip)]
    pub tags: PacketTags,
}

impl Data {
    pub fn new(name: impl Into<Name>, payload: impl Into<Vec<u8>>) -> Self {
        Data {
            name: name.into(),
            payload: payload.into(),
            tags: PacketTags::default(),
        }
    }
}

/// Why an Interest was negatively acknowledged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NackReason {
    /// Reason unspecified by the sender.
    #[default]
    None,
    Congestion,
    Duplicate,
    NoRoute,
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NackReason::None => "none",
            NackReason::Congestion => "congestion",
            NackReason::Duplicate => "duplicate",
            NackReason::NoRoute => "no-route",
        };
        f.write_str(s)
    }
}

/// Negative acknowledgement for a specific Interest.
///
/// On the wire a Nack is an envelope header wrapped around the nacked
/// Interest, so this type has no encoding of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
    pub tags: PacketTags,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Nack {
            interest,
            reason,
            tags: PacketTags::default(),
        }
    }
}

/// Packet classification used in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Interest,
    Data,
    Nack,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketKind::Interest => "Interest",
            PacketKind::Data => "Data",
            PacketKind::Nack => "Nack",
        };
        f.write_str(s)
    }
}
