//! Session-management channel tests over real UDP sockets.
//!
//! The hub's listener is exercised end to end: datagrams are sent from a
//! scratch socket to the hub's management port and observed (or not) in the
//! addressed hook's inbox.

use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use spindle_core::{EndpointHook, Hub, HubConfig, HubError};
use spindle_proto::{SmOpcode, SmPacket};

fn send_datagram(hub: &Hub, bytes: &[u8]) {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    socket.send_to(bytes, (Ipv4Addr::LOCALHOST, hub.local_addr().port())).unwrap();
}

fn send_packet(hub: &Hub, endpoint_id: u8, payload: &[u8]) {
    let packet =
        SmPacket::new(SmOpcode::ConnectRequest, endpoint_id, Bytes::copy_from_slice(payload))
            .unwrap();
    send_datagram(hub, &packet.encode());
}

/// Poll the hook until `count` packets arrived or the deadline passed.
fn collect_packets(hook: &EndpointHook, count: usize, deadline: Duration) -> Vec<SmPacket> {
    let start = Instant::now();
    let mut packets = Vec::new();
    while packets.len() < count && start.elapsed() < deadline {
        packets.extend(hook.drain_packets());
        thread::sleep(Duration::from_millis(5));
    }
    packets
}

#[test]
fn datagram_delivered_exactly_once_in_order() {
    let hub = Hub::new(HubConfig::new(0).with_workers(2)).unwrap();
    let hook = Arc::new(EndpointHook::new(3));
    hub.register_hook(&hook).unwrap();

    send_packet(&hub, 3, b"hello");

    let packets = collect_packets(&hook, 1, Duration::from_secs(2));
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].endpoint_id(), 3);
    assert_eq!(packets[0].opcode(), SmOpcode::ConnectRequest);
    assert_eq!(packets[0].payload().as_ref(), b"hello");

    // No duplication.
    thread::sleep(Duration::from_millis(150));
    assert!(hook.try_packet().is_none());
}

#[test]
fn packets_arrive_in_socket_delivery_order() {
    let hub = Hub::new(HubConfig::new(0)).unwrap();
    let hook = Arc::new(EndpointHook::new(7));
    hub.register_hook(&hook).unwrap();

    for i in 0u8..8 {
        send_packet(&hub, 7, &[i]);
    }

    let packets = collect_packets(&hook, 8, Duration::from_secs(2));
    assert_eq!(packets.len(), 8);
    for (i, packet) in packets.iter().enumerate() {
        assert_eq!(packet.payload().as_ref(), &[i as u8]);
    }
}

#[test]
fn unregistered_endpoint_id_is_silently_discarded() {
    let hub = Hub::new(HubConfig::new(0)).unwrap();
    let hook = Arc::new(EndpointHook::new(3));
    hub.register_hook(&hook).unwrap();

    send_packet(&hub, 9, b"nobody home");
    thread::sleep(Duration::from_millis(200));
    assert!(hook.try_packet().is_none());

    // The channel keeps working afterwards.
    send_packet(&hub, 3, b"still alive");
    let packets = collect_packets(&hook, 1, Duration::from_secs(2));
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].payload().as_ref(), b"still alive");
}

#[test]
fn malformed_datagram_is_absorbed() {
    let hub = Hub::new(HubConfig::new(0)).unwrap();
    let hook = Arc::new(EndpointHook::new(3));
    hub.register_hook(&hook).unwrap();

    send_datagram(&hub, b"not an envelope");
    send_packet(&hub, 3, b"real one");

    let packets = collect_packets(&hook, 1, Duration::from_secs(2));
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].payload().as_ref(), b"real one");
}

#[test]
fn full_drop_probability_is_rejected_at_construction() {
    for probability in [0.96, 1.0] {
        let result = Hub::new(HubConfig::new(0).with_drop_probability(probability));
        assert!(matches!(result, Err(HubError::InvalidDropProbability(_))));
    }
}

#[test]
fn bind_conflict_fails_construction() {
    let first = Hub::new(HubConfig::new(0)).unwrap();
    let port = first.local_addr().port();

    let result = Hub::new(HubConfig::new(port));
    assert!(matches!(result, Err(HubError::Bind { port: p, .. }) if p == port));
}

/// With drop probability p, the delivered fraction over many datagrams
/// converges to 1 - p. The bounds below are ±8σ around the mean, wide
/// enough to make a spurious failure astronomically unlikely.
#[test]
fn synthetic_loss_converges_to_configured_probability() {
    const TOTAL: usize = 300;

    let hub = Hub::new(HubConfig::new(0).with_drop_probability(0.5)).unwrap();
    let hook = Arc::new(EndpointHook::new(1));
    hub.register_hook(&hook).unwrap();

    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let target = (Ipv4Addr::LOCALHOST, hub.local_addr().port());
    for i in 0..TOTAL {
        let packet =
            SmPacket::new(SmOpcode::ConnectRequest, 1, Bytes::from((i as u32).to_be_bytes().to_vec()))
                .unwrap();
        socket.send_to(&packet.encode(), target).unwrap();
        // Pace the burst so the loopback receive buffer never drops for us.
        if i % 20 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    // Wait until the count stops growing.
    let mut delivered = 0;
    let mut idle_rounds = 0;
    let start = Instant::now();
    while idle_rounds < 5 && start.elapsed() < Duration::from_secs(5) {
        let fresh = hook.drain_packets().len();
        if fresh == 0 {
            idle_rounds += 1;
        } else {
            idle_rounds = 0;
            delivered += fresh;
        }
        thread::sleep(Duration::from_millis(50));
    }

    assert!(
        (75..=225).contains(&delivered),
        "delivered {delivered} of {TOTAL} datagrams at p=0.5"
    );
}
