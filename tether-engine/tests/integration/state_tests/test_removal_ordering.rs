use futures::future::join;
use std::time::Duration;
use tether_core::{PeerId, Status};
use tether_engine::TransportEvent;

use crate::integration::{create_listening_engine, init_tracing};
use crate::utils::remote_offer;

#[tokio::test]
async fn test_queued_events_cannot_resurrect_removed_peer() {
    init_tracing();

    let (engine, transport, _observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine.create_connection(&peer_id).await.unwrap();
    let connection = transport.connection(0).unwrap();

    // Queued ahead of the removal, applied before it.
    connection.emit(TransportEvent::ConnectionStateChanged("connected".into()));
    connection.emit_track("t1");
    engine.remove_connection(&peer_id).await.unwrap();

    assert!(engine.snapshot().peer(&peer_id).is_none());
    assert!(!engine.registry().contains(&peer_id).await);
}

#[tokio::test]
async fn test_offer_racing_remove_leaves_consistent_state() {
    init_tracing();

    let (engine, transport, _observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    transport.delay(Duration::from_millis(20));

    let (answered, removed) = join(
        engine.set_remote_offer(&remote_offer("u1", "x")),
        engine.remove_connection(&peer_id),
    )
    .await;
    removed.unwrap();

    // Whichever ran last decides; registry and state must agree.
    let in_registry = engine.registry().contains(&peer_id).await;
    let in_state = engine.snapshot().peer(&peer_id).is_some();
    assert_eq!(in_registry, in_state);
    if answered.is_ok() && in_state {
        assert_eq!(engine.snapshot().status_of(&peer_id), Some(Status::Connecting));
    }
}

#[tokio::test]
async fn test_other_peers_survive_removal() {
    init_tracing();

    let (engine, _transport, _observer) = create_listening_engine().await;
    let leaving = PeerId::from("u1");
    let staying = PeerId::from("u2");
    engine.create_connection(&leaving).await.unwrap();
    engine
        .set_remote_offer(&remote_offer("u2", "x"))
        .await
        .unwrap();

    engine.remove_connection(&leaving).await.unwrap();

    assert_eq!(engine.registry().peer_ids().await, vec![staying.clone()]);
    assert_eq!(engine.snapshot().status_of(&staying), Some(Status::Connecting));
}
