//! relay-stream — the per-connection stream processor and its transport.
//!
//! One task per connection, strictly sequential within a connection:
//! receive a packet, wait out its class-keyed processing delay, echo it
//! back, repeat until the inbound side ends. Connections share nothing
//! but the connection table.

pub mod delay;
pub mod framed;
pub mod processor;
pub mod server;
pub mod stream;

pub use delay::{DelayPolicy, DelaySpec};
pub use framed::FramedStream;
pub use processor::StreamProcessor;
pub use server::{new_conn_table, ConnMeta, ConnTable, Server};
pub use stream::{PacketStream, StreamError};
