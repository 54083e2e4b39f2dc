//! Stream server — accepts connections and runs one processor task each.
//!
//! Connections are fully independent: each task owns its socket and its
//! single in-flight packet, and the only shared state is the connection
//! table entry it inserts on open and removes on close. Tearing down one
//! connection cannot touch another's in-flight state.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dashmap::DashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::delay::DelayPolicy;
use crate::framed::FramedStream;
use crate::processor::StreamProcessor;
use crate::stream::StreamError;

/// Metadata about an active connection.
#[derive(Debug, Clone)]
pub struct ConnMeta {
    /// Peer identity, as reported by the transport. Used for logging only.
    pub peer_addr: SocketAddr,
    /// When the stream was accepted.
    pub established_at: Instant,
}

/// The connection table — shared between the accept loop and the daemon's
/// snapshot printer.
pub type ConnTable = Arc<DashMap<u64, ConnMeta>>;

/// Create a new empty connection table.
pub fn new_conn_table() -> ConnTable {
    Arc::new(DashMap::new())
}

pub struct Server {
    listener: TcpListener,
    policy: DelayPolicy,
    connections: ConnTable,
    shutdown: broadcast::Sender<()>,
    next_conn_id: AtomicU64,
}

impl Server {
    pub fn new(
        listener: TcpListener,
        policy: DelayPolicy,
        connections: ConnTable,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            listener,
            policy,
            connections,
            shutdown,
            next_conn_id: AtomicU64::new(1),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("stream listener shutting down");
                    return Ok(());
                }

                result = self.listener.accept() => {
                    let (stream, peer_addr) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };

                    let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
                    tokio::spawn(handle_connection(
                        conn_id,
                        stream,
                        peer_addr,
                        self.policy.clone(),
                        self.connections.clone(),
                        self.shutdown.subscribe(),
                    ));
                }
            }
        }
    }
}

/// One connection, open to closed.
///
/// Every exit path produces exactly one closure log line and ends the
/// transport-level stream the same way — the normal/error distinction
/// lives in the logged cause only. A shutdown signal drops the processor
/// future mid-delay, which abandons the in-flight wait.
async fn handle_connection(
    conn_id: u64,
    stream: TcpStream,
    peer_addr: SocketAddr,
    policy: DelayPolicy,
    connections: ConnTable,
    mut shutdown: broadcast::Receiver<()>,
) {
    connections.insert(
        conn_id,
        ConnMeta {
            peer_addr,
            established_at: Instant::now(),
        },
    );
    tracing::info!(conn_id, peer = %peer_addr, "connection opened");

    let mut framed = FramedStream::new(stream);
    let processor = StreamProcessor::new(policy);

    let outcome = tokio::select! {
        result = processor.run(&mut framed) => result,
        _ = shutdown.recv() => Err(StreamError::Cancelled),
    };

    match outcome {
        Ok(relayed) => {
            tracing::info!(conn_id, peer = %peer_addr, packets = relayed, "connection closed")
        }
        Err(e) => tracing::warn!(conn_id, peer = %peer_addr, error = %e, "stream error"),
    }

    if let Err(e) = framed.close().await {
        tracing::debug!(conn_id, error = %e, "close after teardown failed");
    }
    connections.remove(&conn_id);
}
