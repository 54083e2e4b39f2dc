use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use zerocopy::AsBytes;

use relay_core::wire::{FrameHeader, FRAME_VERSION};
use relay_core::PacketClass;
use relay_stream::{FramedStream, PacketStream};

use crate::*;

/// The inbound side faults after one packet has been delivered — the
/// outbound side carries exactly that packet, then the stream ends.
/// No further packets are read.
#[tokio::test]
async fn read_error_after_one_packet_emits_only_that_packet() {
    let server = start_server(test_policy()).await.unwrap();

    let mut raw = TcpStream::connect(server.addr).await.unwrap();
    let p1 = packet(1, PacketClass::Payload, "b");

    // One well-formed frame, then a frame the server must reject.
    let header = FrameHeader::for_packet(&p1).unwrap();
    raw.write_all(header.as_bytes()).await.unwrap();
    raw.write_all(&p1.payload).await.unwrap();

    let mut bad = FrameHeader::for_packet(&p1).unwrap();
    bad.version = FRAME_VERSION + 1;
    raw.write_all(bad.as_bytes()).await.unwrap();
    raw.write_all(&p1.payload).await.unwrap();
    raw.flush().await.unwrap();

    let mut client = FramedStream::new(raw);
    assert_eq!(client.recv().await.unwrap(), Some(p1));
    // The server tore the stream down on the malformed frame.
    assert!(client.recv().await.unwrap().is_none());
}

/// A write side that vanishes mid-frame is a transport error, not a
/// normal close — the server emits nothing and ends the stream.
#[tokio::test]
async fn truncated_frame_tears_down_without_output() {
    let server = start_server(test_policy()).await.unwrap();

    let mut raw = TcpStream::connect(server.addr).await.unwrap();
    let p = packet(9, PacketClass::Control, "half");
    let header = FrameHeader::for_packet(&p).unwrap();
    raw.write_all(&header.as_bytes()[..8]).await.unwrap();
    raw.shutdown().await.unwrap();

    let mut client = FramedStream::new(raw);
    assert!(client.recv().await.unwrap().is_none());
}

/// One connection failing leaves the server accepting and relaying for
/// fresh connections.
#[tokio::test]
async fn server_survives_a_failed_connection() {
    let server = start_server(test_policy()).await.unwrap();

    {
        let mut raw = TcpStream::connect(server.addr).await.unwrap();
        raw.write_all(&[0xff; 16]).await.unwrap();
        raw.shutdown().await.unwrap();
    }

    // Give the failed task time to run its teardown path.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut client = connect(&server).await.unwrap();
    let p = packet(1, PacketClass::Control, "still alive");
    client.send(p.clone()).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), Some(p));
    client.close().await.unwrap();
    assert!(client.recv().await.unwrap().is_none());
}
