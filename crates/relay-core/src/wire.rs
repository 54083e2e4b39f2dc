//! Relay wire format — on-wire types for the packet stream.
//!
//! A connection carries a back-to-back sequence of frames in each
//! direction. Every frame is a FrameHeader followed by `length` payload
//! bytes. These types ARE the protocol: every field, every size, every
//! reserved byte is part of the wire format.
//!
//! All types are #[repr(C, packed)] for deterministic layout and use
//! zerocopy derives for safe, allocation-free serialization. There is no
//! unsafe code in this module.

use bytes::Bytes;
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

// ── Frame Header ─────────────────────────────────────────────────────────────

/// Precedes every packet on the wire.
///
/// The receiver can fully describe and validate a frame before reading a
/// single byte of payload. A stream ends cleanly when the peer closes its
/// write side exactly at a frame boundary; bytes missing mid-frame are a
/// transport error, not end-of-stream.
///
/// Wire size: 16 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct FrameHeader {
    /// Caller-assigned packet identifier. Opaque to the relay — echoed
    /// back unchanged on the outbound frame, never interpreted.
    pub id: u64,

    /// Length of the payload in bytes, not including this header.
    /// Maximum: MAX_PAYLOAD. Larger frames are rejected.
    pub length: u32,

    /// Packet classification. 0x00 control, 0x01 payload.
    /// An unknown class rejects the frame.
    pub class: u8,

    /// Wire format version. Currently 0x01.
    /// An unknown version rejects the frame.
    pub version: u8,

    /// Bit flags. Reserved, must be zero.
    pub flags: u8,

    /// Reserved, must be zero.
    pub reserved: u8,
}

// Compile-time size guard. If this fails, the wire format has silently changed.
assert_eq_size!(FrameHeader, [u8; 16]);

impl FrameHeader {
    /// Build the header for an outbound packet.
    /// Fails if the payload exceeds MAX_PAYLOAD.
    pub fn for_packet(packet: &MediaPacket) -> Result<Self, WireError> {
        if packet.payload.len() > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge(packet.payload.len()));
        }
        Ok(Self {
            id: packet.id,
            length: packet.payload.len() as u32,
            class: packet.class.into(),
            version: FRAME_VERSION,
            flags: 0,
            reserved: 0,
        })
    }

    /// Validate an inbound header and extract its classification.
    pub fn validate(&self) -> Result<PacketClass, WireError> {
        if self.version != FRAME_VERSION {
            return Err(WireError::UnknownVersion(self.version));
        }
        // Copy to a local — `length` is packed.
        let length = self.length;
        if length as usize > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge(length as usize));
        }
        PacketClass::try_from(self.class)
    }
}

// ── Packet Class ─────────────────────────────────────────────────────────────

/// Packet classification — selects the processing-delay policy.
///
/// The relay never inspects payload contents; the class is the only input
/// to scheduling. More classes may be added; policy is keyed on class
/// identity, never on payload semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketClass {
    /// Control-plane traffic. Negligible processing cost, fixed small delay.
    Control = 0x00,

    /// Media payload traffic. Variable processing cost, randomized delay.
    Payload = 0x01,
}

impl TryFrom<u8> for PacketClass {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(PacketClass::Control),
            0x01 => Ok(PacketClass::Payload),
            other => Err(WireError::UnknownClass(other)),
        }
    }
}

impl From<PacketClass> for u8 {
    fn from(c: PacketClass) -> u8 {
        c as u8
    }
}

// ── Packet ───────────────────────────────────────────────────────────────────

/// The unit of data exchanged over a stream.
///
/// The relay is a latency-injecting identity transform: an outbound packet
/// is byte-identical to the inbound packet it answers — same id, same
/// class, same payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPacket {
    pub id: u64,
    pub class: PacketClass,
    pub payload: Bytes,
}

impl MediaPacket {
    pub fn new(id: u64, class: PacketClass, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            class,
            payload: payload.into(),
        }
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Current frame format version.
pub const FRAME_VERSION: u8 = 0x01;

/// Maximum payload size in bytes. Larger data must be split by the sender.
pub const MAX_PAYLOAD: usize = 1 << 20;

/// Size of the frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = std::mem::size_of::<FrameHeader>();

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("unknown packet class: 0x{0:02x}")]
    UnknownClass(u8),

    #[error("unknown frame version: 0x{0:02x}")]
    UnknownVersion(u8),

    #[error("payload length {0} exceeds maximum {}", MAX_PAYLOAD)]
    PayloadTooLarge(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
