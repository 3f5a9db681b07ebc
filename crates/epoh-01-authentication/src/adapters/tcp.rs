//! Newline-delimited JSON frames over a TCP stream.

use std::net::SocketAddr;

use async_trait::async_trait;
use shared_types::{Frame, MAX_FRAME_BYTES};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::ports::outbound::{Transport, TransportError};

/// Framed TCP connection.
#[derive(Debug)]
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: String,
    line: String,
}

impl TcpTransport {
    /// Wrap an accepted or connected stream.
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr: SocketAddr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            line: String::new(),
        }
    }

    /// Connect to a Leader.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let line = frame.encode_line()?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Frame, TransportError> {
        self.line.clear();
        let limit = (MAX_FRAME_BYTES + 2) as u64;
        let read = (&mut self.reader).take(limit).read_line(&mut self.line).await?;

        if read == 0 {
            return Err(TransportError::Closed);
        }
        if !self.line.ends_with('\n') {
            if read as u64 >= limit {
                return Err(TransportError::Frame(format!(
                    "frame exceeds {MAX_FRAME_BYTES} bytes"
                )));
            }
            return Err(TransportError::Closed);
        }
        Ok(Frame::decode(&self.line)?)
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}
