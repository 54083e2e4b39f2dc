//! Length-prefixed frame codec over a byte stream.
//!
//! Works over any AsyncRead + AsyncWrite — a TcpStream in the daemon,
//! an in-memory duplex in tests. One frame is a FrameHeader followed by
//! its payload; the stream ends cleanly when the peer closes its write
//! side exactly at a frame boundary.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use zerocopy::{AsBytes, FromBytes};

use relay_core::wire::{FrameHeader, FRAME_HEADER_SIZE};
use relay_core::MediaPacket;

use crate::stream::{PacketStream, StreamError};

pub struct FramedStream<T> {
    io: T,
}

impl<T: AsyncRead + AsyncWrite + Unpin> FramedStream<T> {
    pub fn new(io: T) -> Self {
        Self { io }
    }

    /// Shut down the write side, signalling end-of-stream to the peer.
    ///
    /// Both normal and error teardown end the stream this way; the cause
    /// is carried in logs only, never on the wire.
    pub async fn close(&mut self) -> std::io::Result<()> {
        self.io.shutdown().await
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> PacketStream for FramedStream<T> {
    async fn recv(&mut self) -> Result<Option<MediaPacket>, StreamError> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = self
                .io
                .read(&mut header_buf[filled..])
                .await
                .map_err(StreamError::from_read)?;
            if n == 0 {
                if filled == 0 {
                    // Clean close at a frame boundary.
                    return Ok(None);
                }
                return Err(StreamError::Read(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                )));
            }
            filled += n;
        }

        let header = match FrameHeader::read_from(&header_buf[..]) {
            Some(h) => h,
            None => {
                return Err(StreamError::Read(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "failed to parse frame header",
                )))
            }
        };
        let class = header.validate()?;

        // Copy packed fields to locals before use.
        let id = header.id;
        let length = header.length as usize;

        let mut payload = vec![0u8; length];
        self.io
            .read_exact(&mut payload)
            .await
            .map_err(StreamError::from_read)?;

        Ok(Some(MediaPacket {
            id,
            class,
            payload: Bytes::from(payload),
        }))
    }

    async fn send(&mut self, packet: MediaPacket) -> Result<(), StreamError> {
        let header = FrameHeader::for_packet(&packet)?;
        self.io
            .write_all(header.as_bytes())
            .await
            .map_err(StreamError::from_write)?;
        self.io
            .write_all(&packet.payload)
            .await
            .map_err(StreamError::from_write)?;
        self.io.flush().await.map_err(StreamError::from_write)?;
        Ok(())
    }
}
