use tether_core::{PeerId, Status, TrackKind};
use tether_engine::{Notification, TransportEvent};

use crate::integration::{create_listening_engine, init_tracing};
use crate::utils::remote_offer;

#[tokio::test]
async fn test_track_marks_peer_connected() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();

    transport.connection(0).unwrap().emit_track("t1");
    assert!(
        observer
            .wait_for(|n| matches!(n, Notification::TrackAdded(_)), 1000)
            .await
    );

    let state = engine.snapshot();
    let peer = state.peer(&peer_id).unwrap();
    assert_eq!(peer.connection_status, Status::Connected);
    let track = peer.track.as_ref().unwrap();
    assert_eq!(track.id, "t1");
    assert_eq!(track.stream_id, "stream-t1");
    assert_eq!(track.kind, TrackKind::Video);
}

#[tokio::test]
async fn test_track_only_touches_its_own_peer() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine.create_connection(&peer_id).await.unwrap();
    engine.create_connection(&PeerId::from("u2")).await.unwrap();

    transport.connection(1).unwrap().emit_track("t9");
    assert!(
        observer
            .wait_for(|n| matches!(n, Notification::TrackAdded(_)), 1000)
            .await
    );

    let state = engine.snapshot();
    assert_eq!(state.status_of(&peer_id), Some(Status::New));
    assert_eq!(state.status_of(&PeerId::from("u2")), Some(Status::Connected));
}

#[tokio::test]
async fn test_track_removed_by_transport_clears_track() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine.create_connection(&peer_id).await.unwrap();
    let connection = transport.connection(0).unwrap();

    connection.emit_track("t1");
    connection.emit(TransportEvent::TrackRemoved { id: "t1".into() });
    assert!(
        observer
            .wait_for(|n| matches!(n, Notification::TrackRemoved { .. }), 1000)
            .await
    );

    let state = engine.snapshot();
    let peer = state.peer(&peer_id).unwrap();
    assert!(!peer.has_track());
    assert_eq!(peer.connection_status, Status::Disconnected);
    assert!(engine.registry().contains(&peer_id).await);
}

#[tokio::test]
async fn test_remove_reports_track_removed_with_or_without_track() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let with_track = PeerId::from("u1");
    let without_track = PeerId::from("u2");
    engine.create_connection(&with_track).await.unwrap();
    engine.create_connection(&without_track).await.unwrap();
    transport.connection(0).unwrap().emit_track("t1");

    engine.remove_connection(&with_track).await.unwrap();
    engine.remove_connection(&without_track).await.unwrap();

    assert!(
        observer
            .wait_for_count(|n| matches!(n, Notification::TrackRemoved { .. }), 2, 1000)
            .await
    );
    let notifications = observer.notifications().await;
    for peer_id in [with_track, without_track] {
        assert!(notifications.contains(&Notification::TrackRemoved { peer_id }));
    }
    assert!(engine.snapshot().peers.is_empty());
}
