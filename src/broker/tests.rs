use super::topic::Topic;
use super::{TopicRegistry, forward};
use crate::client::{Connection, ConnectionId, Outbound};
use crate::transport::message::{Frame, Inbound};
use serde_json::json;
use tokio::sync::mpsc;

fn connect(registry: &TopicRegistry) -> (ConnectionId, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = Connection::new(tx);
    let id = conn.id.clone();
    registry.register_connection(conn);
    (id, rx)
}

fn received(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Frame {
    let bytes = rx.try_recv().expect("expected a forwarded frame");
    match Frame::decode(&bytes).unwrap() {
        Inbound::Frame(frame) => frame,
        Inbound::Unknown(action) => panic!("unexpected action {action}"),
    }
}

#[test]
fn test_topic_new() {
    let topic = Topic::new("test_topic");
    assert_eq!(topic.name, "test_topic");
    assert!(topic.subscribers.is_empty());
    assert!(topic.publishers.is_empty());
    assert!(topic.is_empty());
}

#[test]
fn test_topic_subscribe_is_idempotent() {
    let mut topic = Topic::new("test_topic");
    let id = ConnectionId::new();
    assert!(topic.subscribe(id.clone()));
    assert!(!topic.subscribe(id.clone()));
    assert_eq!(topic.subscribers.len(), 1);

    topic.remove(&id);
    assert!(topic.is_empty());
}

#[test]
fn test_register_subscriber_twice_is_noop() {
    let registry = TopicRegistry::new();
    let (id, _rx) = connect(&registry);

    assert!(registry.register_subscriber(&id, "t"));
    assert!(!registry.register_subscriber(&id, "t"));
    assert_eq!(registry.subscriber_count("t"), 1);
    assert_eq!(registry.subscribers_of("t").len(), 1);
}

#[test]
fn test_publishers_are_bookkeeping_only() {
    let registry = TopicRegistry::new();
    let (id, mut rx) = connect(&registry);

    registry.register_publisher(&id, "t");
    assert_eq!(registry.publisher_count("t"), 1);
    assert!(registry.subscribers_of("t").is_empty());

    let delivery = forward(&registry, "t", json!("hi")).unwrap();
    assert_eq!(delivery.attempted, 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_subscribers_of_unknown_topic_is_empty() {
    let registry = TopicRegistry::new();
    assert!(registry.subscribers_of("nope").is_empty());
    assert_eq!(registry.subscriber_count("nope"), 0);
}

#[test]
fn test_unregister_removes_connection_everywhere() {
    let registry = TopicRegistry::new();
    let (id, _rx) = connect(&registry);
    let (other, _other_rx) = connect(&registry);

    registry.register_subscriber(&id, "a");
    registry.register_subscriber(&id, "b");
    registry.register_publisher(&id, "c");
    registry.register_subscriber(&other, "a");

    assert!(registry.unregister(&id));
    assert!(!registry.is_live(&id));
    assert_eq!(registry.connection_count(), 1);
    assert_eq!(registry.subscriber_count("a"), 1);
    assert_eq!(registry.subscriber_count("b"), 0);
    assert_eq!(registry.publisher_count("c"), 0);
    // "b" and "c" had no other members and are pruned
    assert_eq!(registry.topic_count(), 1);

    assert!(!registry.unregister(&id));
}

#[test]
fn test_snapshot_survives_concurrent_unregister() {
    let registry = TopicRegistry::new();
    let (id, mut rx) = connect(&registry);
    registry.register_subscriber(&id, "t");

    let snapshot = registry.subscribers_of("t");
    registry.unregister(&id);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(registry.subscriber_count("t"), 0);
    // the snapshot still holds a usable handle
    snapshot[0].send(Outbound::from(&b"late\n"[..])).unwrap();
    assert_eq!(&*rx.try_recv().unwrap(), b"late\n");
}

#[test]
fn test_forward_reaches_every_subscriber() {
    let registry = TopicRegistry::new();
    let (a1, mut rx1) = connect(&registry);
    let (a2, mut rx2) = connect(&registry);
    let (_b, mut rx_b) = connect(&registry);
    registry.register_subscriber(&a1, "t");
    registry.register_subscriber(&a2, "t");

    let delivery = forward(&registry, "t", json!({"n": 1})).unwrap();
    assert_eq!(delivery.attempted, 2);
    assert_eq!(delivery.delivered, 2);

    let expected = Frame::ForwardMessage {
        topic: "t".to_string(),
        data: json!({"n": 1}),
    };
    assert_eq!(received(&mut rx1), expected);
    assert_eq!(received(&mut rx2), expected);
    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn test_forward_with_no_subscribers_is_dropped() {
    let registry = TopicRegistry::new();
    let delivery = forward(&registry, "nobody", json!(null)).unwrap();
    assert_eq!(delivery, super::Delivery::default());
}

#[test]
fn test_forward_skips_closed_subscriber() {
    let registry = TopicRegistry::new();
    let (dead, dead_rx) = connect(&registry);
    let (alive, mut alive_rx) = connect(&registry);
    registry.register_subscriber(&dead, "t");
    registry.register_subscriber(&alive, "t");
    drop(dead_rx);

    let delivery = forward(&registry, "t", json!("hi")).unwrap();
    assert_eq!(delivery.attempted, 2);
    assert_eq!(delivery.delivered, 1);
    assert!(matches!(received(&mut alive_rx), Frame::ForwardMessage { .. }));

    // failed sends do not unregister
    assert!(registry.is_live(&dead));
    assert_eq!(registry.subscriber_count("t"), 2);
}

#[test]
fn test_forward_preserves_order_per_subscriber() {
    let registry = TopicRegistry::new();
    let (id, mut rx) = connect(&registry);
    registry.register_subscriber(&id, "t");

    for n in 0..5 {
        forward(&registry, "t", json!(n)).unwrap();
    }
    for n in 0..5 {
        match received(&mut rx) {
            Frame::ForwardMessage { data, .. } => assert_eq!(data, json!(n)),
            other => panic!("unexpected frame {other:?}"),
        }
    }
}
