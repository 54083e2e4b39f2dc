//! The stream processor — the per-connection relay loop.
//!
//! Consumes one inbound packet at a time, waits out the class-keyed
//! processing delay, and emits the identity copy in arrival order.
//! Strictly sequential within a connection: the next packet is not read
//! until the current one has been written back, so per-connection memory
//! is bounded to one in-flight packet and outbound order is the inbound
//! order. The delay sleep is the loop's only suspension point.

use crate::delay::DelayPolicy;
use crate::stream::{PacketStream, StreamError};

pub struct StreamProcessor {
    policy: DelayPolicy,
}

impl StreamProcessor {
    pub fn new(policy: DelayPolicy) -> Self {
        Self { policy }
    }

    /// Run the relay loop until the inbound sequence ends.
    ///
    /// Returns the number of packets relayed on clean end-of-stream. The
    /// first recv or send failure ends the loop immediately: nothing more
    /// is read or written, and the packet being processed is not retried.
    pub async fn run<S: PacketStream>(&self, stream: &mut S) -> Result<u64, StreamError> {
        let mut relayed = 0u64;

        while let Some(packet) = stream.recv().await? {
            let delay = self.policy.delay_for(packet.class);
            tracing::debug!(
                id = packet.id,
                class = ?packet.class,
                delay_ms = delay.as_millis() as u64,
                "processing packet"
            );

            tokio::time::sleep(delay).await;

            stream.send(packet).await?;
            relayed += 1;
        }

        Ok(relayed)
    }
}
