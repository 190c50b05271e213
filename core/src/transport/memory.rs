//! In-process transport over a pair of unbounded channels

use tokio::sync::mpsc;

use super::{Transport, TransportError};

/// In-memory transport. Created in connected pairs; each side sends into
/// the other's receiver. Blocks are buffered without bound, so sends never
/// block and arrive in order.
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: bool,
}

impl MemoryTransport {
    /// Two connected transports. Blocks sent on one arrive at the other.
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            MemoryTransport { tx: a_tx, rx: Some(a_rx), closed: false },
            MemoryTransport { tx: b_tx, rx: Some(b_rx), closed: false },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, block: Vec<u8>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.tx.send(block).map_err(|_| TransportError::Closed)
    }

    fn take_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<u8>>> {
        self.rx.take()
    }

    fn is_connected(&self) -> bool {
        !self.closed && !self.tx.is_closed()
    }

    fn close(&mut self) {
        self.closed = true;
        // Dropping our receiver makes the peer's sends fail.
        self.rx = None;
    }
}
