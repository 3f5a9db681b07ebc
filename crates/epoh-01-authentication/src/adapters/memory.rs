//! In-process transport over tokio channels.
//!
//! Frames still go through the line codec so that tests exercise the same
//! encoding as the TCP path.

use async_trait::async_trait;
use shared_types::Frame;
use tokio::sync::mpsc;

use crate::ports::outbound::{Transport, TransportError};

const CHANNEL_CAPACITY: usize = 64;

/// One end of an in-memory duplex channel.
#[derive(Debug)]
pub struct MemoryTransport {
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
    label: &'static str,
}

impl MemoryTransport {
    /// Two connected ends: `(client, leader)`.
    pub fn pair() -> (Self, Self) {
        let (to_leader, from_client) = mpsc::channel(CHANNEL_CAPACITY);
        let (to_client, from_leader) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                tx: to_leader,
                rx: from_leader,
                label: "memory:client",
            },
            Self {
                tx: to_client,
                rx: from_client,
                label: "memory:leader",
            },
        )
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let line = frame.encode_line()?;
        self.tx.send(line).await.map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Frame, TransportError> {
        let line = self.rx.recv().await.ok_or(TransportError::Closed)?;
        Ok(Frame::decode(&line)?)
    }

    fn peer(&self) -> String {
        self.label.to_string()
    }
}
