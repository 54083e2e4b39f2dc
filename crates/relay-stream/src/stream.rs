//! Transport seam — the contract between the processor and the transport.
//!
//! The processor consumes exactly this surface: pull the next inbound
//! packet, push the next outbound packet, observe closure. Listener
//! binding, framing, and security all live on the transport side.

use relay_core::wire::WireError;
use relay_core::MediaPacket;

/// One bidirectional, ordered, per-connection packet channel.
///
/// Intentionally minimal. No request/response abstraction, no read-ahead:
/// the processor calls `recv` and `send` strictly alternately, so an
/// implementation never sees more than one packet in flight.
#[allow(async_fn_in_trait)]
pub trait PacketStream {
    /// Pull the next inbound packet. `Ok(None)` is clean end-of-stream:
    /// the peer finished its sequence without error.
    async fn recv(&mut self) -> Result<Option<MediaPacket>, StreamError>;

    /// Push the next outbound packet.
    async fn send(&mut self, packet: MediaPacket) -> Result<(), StreamError>;
}

/// Why a stream ended early.
///
/// None of these are retried: the first failure tears down the whole
/// connection. Packet-level and stream-level failure are deliberately not
/// distinguished.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Inbound read failed, including frames truncated by a mid-frame close.
    #[error("transport read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Outbound send failed, e.g. the peer disconnected mid-write.
    #[error("transport write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The peer cancelled the stream, or a local shutdown cancelled it.
    #[error("stream cancelled")]
    Cancelled,

    /// The inbound bytes do not form a valid frame.
    #[error("malformed frame: {0}")]
    Frame(#[from] WireError),
}

impl StreamError {
    /// Classify an io error on the read side.
    /// A vanished peer counts as cancellation, not as a read fault.
    pub fn from_read(e: std::io::Error) -> Self {
        if is_cancellation(&e) {
            StreamError::Cancelled
        } else {
            StreamError::Read(e)
        }
    }

    /// Classify an io error on the write side.
    pub fn from_write(e: std::io::Error) -> Self {
        if is_cancellation(&e) {
            StreamError::Cancelled
        } else {
            StreamError::Write(e)
        }
    }
}

/// TCP has no explicit cancel signal — a peer that goes away surfaces as
/// one of these error kinds on the next read or write.
fn is_cancellation(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
    )
}
