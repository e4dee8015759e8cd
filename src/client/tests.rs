use super::connection::{Connection, Outbound};
use crate::utils::Error;
use tokio::sync::mpsc;

fn frame(text: &str) -> Outbound {
    Outbound::from(text.as_bytes())
}

#[test]
fn test_connection_ids_are_unique() {
    let (tx, _rx) = mpsc::unbounded_channel::<Outbound>();
    let a = Connection::new(tx.clone());
    let b = Connection::new(tx);
    assert!(a.id.to_string().starts_with("conn-"));
    assert_ne!(a.id, b.id);
}

#[test]
fn test_send_queues_frame() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = Connection::new(tx);
    conn.send(frame("hello\n")).unwrap();
    assert_eq!(&*rx.try_recv().unwrap(), b"hello\n");
}

#[test]
fn test_unread_frames_are_never_dropped() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = Connection::new(tx);
    for n in 0..10_000 {
        conn.send(frame(&format!("{n}\n"))).unwrap();
    }
    for n in 0..10_000 {
        assert_eq!(&*rx.try_recv().unwrap(), format!("{n}\n").as_bytes());
    }
}

#[test]
fn test_send_after_receiver_dropped_is_connection_closed() {
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = Connection::new(tx);
    drop(rx);
    assert!(matches!(conn.send(frame("x\n")), Err(Error::ConnectionClosed)));
}
