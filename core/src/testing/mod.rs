//! Test harness: a scripted peer on the far end of a memory transport
//!
//! [`TestPeer`] plays the forwarder in tests: it decodes the blocks a
//! face sends, asserts on them, and synthesizes Data, Nacks, and control
//! responses back. [`face_and_peer`] wires a face and a peer over a
//! [`MemoryTransport`] pair.
//!
//! # Example
//!
//! ```ignore
//! let (face, mut peer) = face_and_peer(FaceConfig::for_testing());
//!
//! face.express_interest(Interest::new("/a"), on_data, on_nack, on_timeout)?;
//! let interest = peer.recv_interest().await;
//! peer.send_data(Data::new("/a", b"payload".to_vec()));
//! ```

use tokio::sync::mpsc;

use crate::control::{ControlParameters, ControlResponse, ControlVerb, KeyedSigner};
use crate::dispatch::encode_outbound;
use crate::face::{Face, FaceConfig};
use crate::packet::{Data, Interest, Nack, NackReason, Name, MAX_PACKET_SIZE};
use crate::transport::{MemoryTransport, Transport};
use crate::wire::{decode_envelope, decode_packet, LpEnvelope, NetPacket};

/// A face wired to a scripted peer over an in-memory link.
pub fn face_and_peer(config: FaceConfig) -> (Face, TestPeer) {
    let (local, remote) = MemoryTransport::pair();
    let peer = TestPeer::new(remote, &config);
    let face = Face::new(local, KeyedSigner::for_testing(), config);
    (face, peer)
}

/// One registration command as the peer received it.
#[derive(Debug)]
pub struct ReceivedCommand {
    /// The full command name, echoed back as the response Data's name.
    pub name: Name,
    pub verb: ControlVerb,
    pub params: ControlParameters,
    /// Whether the trailing signature verifies under the test key.
    pub signature_valid: bool,
}

/// The far end of a face's transport, driven directly by tests.
pub struct TestPeer {
    transport: MemoryTransport,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    signer: KeyedSigner,
    command_prefix: Name,
}

impl TestPeer {
    pub fn new(mut transport: MemoryTransport, config: &FaceConfig) -> Self {
        let rx = transport.take_receiver().expect("peer receiver already taken");
        TestPeer {
            transport,
            rx,
            signer: KeyedSigner::for_testing(),
            command_prefix: config.command_prefix.clone(),
        }
    }

    // ========== Receiving from the face ==========

    /// Next raw block the face sent. Panics if the face is gone.
    pub async fn recv_block(&mut self) -> Vec<u8> {
        self.rx.recv().await.expect("face closed its transport")
    }

    /// A block the face already sent, or `None` if none is queued.
    pub fn try_recv_block(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    pub async fn recv_envelope(&mut self) -> LpEnvelope {
        let block = self.recv_block().await;
        decode_envelope(&block).expect("face sent an undecodable block")
    }

    pub async fn recv_packet(&mut self) -> NetPacket {
        let envelope = self.recv_envelope().await;
        decode_packet(&envelope.fragment).expect("face sent an undecodable fragment")
    }

    /// Next packet, which must be a plain Interest.
    pub async fn recv_interest(&mut self) -> Interest {
        let envelope = self.recv_envelope().await;
        assert_eq!(envelope.nack, None, "expected a plain interest, got a nack");
        match decode_packet(&envelope.fragment).expect("undecodable fragment") {
            NetPacket::Interest(interest) => interest,
            other => panic!("expected an interest, got {other:?}"),
        }
    }

    /// Next packet, which must be a Data.
    pub async fn recv_data(&mut self) -> Data {
        match self.recv_packet().await {
            NetPacket::Data(data) => data,
            other => panic!("expected data, got {other:?}"),
        }
    }

    /// Next packet, which must be a registration command under the
    /// configured command prefix. Parses the verb, parameters, and
    /// signature out of the name.
    pub async fn recv_command(&mut self) -> ReceivedCommand {
        let interest = self.recv_interest().await;
        let name = interest.name;
        let base = self.command_prefix.len();
        assert!(
            self.command_prefix.is_prefix_of(&name) && name.len() == base + 4,
            "not a command name: {name}"
        );

        let verb = ControlVerb::from_component(name.component(base).unwrap())
            .unwrap_or_else(|| panic!("unknown command verb in {name}"));
        let params: ControlParameters = postcard::from_bytes(name.component(base + 1).unwrap())
            .expect("undecodable control parameters");
        let signed_portion =
            postcard::to_stdvec(&name.prefix(name.len() - 1)).expect("name encodes");
        let signature_valid =
            self.signer.verify(&signed_portion, name.component(name.len() - 1).unwrap());
        ReceivedCommand { name, verb, params, signature_valid }
    }

    // ========== Sending to the face ==========

    pub fn send_block(&mut self, block: Vec<u8>) {
        self.transport.send(block).expect("face closed its transport");
    }

    pub fn send_interest(&mut self, interest: Interest) {
        let tags = interest.tags.clone();
        let block = encode_outbound(NetPacket::Interest(interest), None, &tags, MAX_PACKET_SIZE)
            .expect("interest encodes");
        self.send_block(block);
    }

    pub fn send_data(&mut self, data: Data) {
        let tags = data.tags.clone();
        let block =
            encode_outbound(NetPacket::Data(data), None, &tags, MAX_PACKET_SIZE).expect("data encodes");
        self.send_block(block);
    }

    /// Nack `interest` back at the face, keeping its nonce so the face
    /// can correlate it.
    pub fn send_nack(&mut self, interest: Interest, reason: NackReason) {
        let nack = Nack::new(interest, reason);
        let tags = nack.tags.clone();
        let block =
            encode_outbound(NetPacket::Interest(nack.interest), Some(nack.reason), &tags, MAX_PACKET_SIZE)
                .expect("nack encodes");
        self.send_block(block);
    }

    /// Acknowledge a command with a success response.
    pub fn respond_ok(&mut self, command: &Name) {
        self.respond(command, ControlResponse::ok());
    }

    /// Refuse a command with `code` and `text`.
    pub fn respond_error(&mut self, command: &Name, code: u32, text: &str) {
        self.respond(command, ControlResponse::error(code, text));
    }

    fn respond(&mut self, command: &Name, response: ControlResponse) {
        let payload = postcard::to_stdvec(&response).expect("response encodes");
        self.send_data(Data::new(command.clone(), payload));
    }
}
