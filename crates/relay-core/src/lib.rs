//! relay-core — shared types, wire format, and configuration.
//! All other relay crates depend on this one.

pub mod config;
pub mod wire;

pub use wire::{MediaPacket, PacketClass};
