use std::time::Instant;

use relay_core::PacketClass;
use relay_stream::PacketStream;

use crate::*;

/// A control packet followed by a payload packet comes back identical,
/// in order, and the stream then closes normally.
#[tokio::test]
async fn two_packet_scenario_relays_identity_in_order() {
    let server = start_server(test_policy()).await.unwrap();
    let mut client = connect(&server).await.unwrap();

    let p1 = packet(1, PacketClass::Control, "a");
    let p2 = packet(2, PacketClass::Payload, "b");
    client.send(p1.clone()).await.unwrap();
    client.send(p2.clone()).await.unwrap();
    client.close().await.unwrap();

    assert_eq!(client.recv().await.unwrap(), Some(p1));
    assert_eq!(client.recv().await.unwrap(), Some(p2));
    assert!(client.recv().await.unwrap().is_none());
}

#[tokio::test]
async fn empty_stream_closes_normally() {
    let server = start_server(test_policy()).await.unwrap();
    let mut client = connect(&server).await.unwrap();

    client.close().await.unwrap();
    assert!(client.recv().await.unwrap().is_none());
}

/// All previously-accepted packets are emitted before the close, in
/// arrival order, with ids and payloads untouched.
#[tokio::test]
async fn longer_sequence_preserves_order_and_identity() {
    let server = start_server(test_policy()).await.unwrap();
    let mut client = connect(&server).await.unwrap();

    let packets: Vec<_> = (0..6u64)
        .map(|id| packet(id, PacketClass::Control, &format!("payload-{id}")))
        .collect();
    for p in &packets {
        client.send(p.clone()).await.unwrap();
    }
    client.close().await.unwrap();

    for expected in &packets {
        assert_eq!(client.recv().await.unwrap().as_ref(), Some(expected));
    }
    assert!(client.recv().await.unwrap().is_none());
}

/// Control-class round trips finish well below the payload floor;
/// payload-class round trips never undercut it.
#[tokio::test]
async fn delay_policy_separates_the_classes() {
    let server = start_server(test_policy()).await.unwrap();
    let mut client = connect(&server).await.unwrap();

    let start = Instant::now();
    client
        .send(packet(1, PacketClass::Control, "ping"))
        .await
        .unwrap();
    assert!(client.recv().await.unwrap().is_some());
    let control_elapsed = start.elapsed();

    let start = Instant::now();
    client
        .send(packet(2, PacketClass::Payload, "frame"))
        .await
        .unwrap();
    assert!(client.recv().await.unwrap().is_some());
    let payload_elapsed = start.elapsed();

    assert!(
        control_elapsed < PAYLOAD_FLOOR,
        "control round trip took {control_elapsed:?}"
    );
    assert!(
        payload_elapsed >= PAYLOAD_FLOOR,
        "payload round trip undercut the floor: {payload_elapsed:?}"
    );
    assert!(control_elapsed < payload_elapsed);
}

/// The payload delay is drawn per packet — a burst's total wait is at
/// least packets × floor.
#[tokio::test]
async fn payload_delays_accumulate_per_packet() {
    let server = start_server(test_policy()).await.unwrap();
    let mut client = connect(&server).await.unwrap();

    let start = Instant::now();
    for id in 0..3u64 {
        client
            .send(packet(id, PacketClass::Payload, "frame"))
            .await
            .unwrap();
        assert!(client.recv().await.unwrap().is_some());
    }
    assert!(start.elapsed() >= PAYLOAD_FLOOR * 3);
}
