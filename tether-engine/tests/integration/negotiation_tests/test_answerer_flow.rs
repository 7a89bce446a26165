use tether_core::{PeerId, SignalMessage, Status};
use tether_engine::{Notification, SdpKind, TransportEvent};

use crate::integration::{create_listening_engine, init_tracing};
use crate::utils::remote_offer;

#[tokio::test]
async fn test_remote_offer_creates_connection_and_answers() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");

    let answer = engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .expect("Answer failed");

    assert!(engine.registry().contains(&peer_id).await);
    assert_eq!(transport.created(), 1);
    assert_eq!(answer.sdp, "answer-0");
    assert_eq!(answer.from, PeerId::from("local"));
    assert_eq!(answer.to, peer_id);
    assert_eq!(engine.snapshot().status_of(&peer_id), Some(Status::Connecting));

    let connection = transport.connection(0).unwrap();
    assert_eq!(connection.remote_description().unwrap().sdp, "x");
    assert_eq!(connection.local_description().unwrap().kind, SdpKind::Answer);

    assert!(
        observer
            .wait_for(|n| matches!(n, Notification::Signal(_)), 1000)
            .await
    );
    assert_eq!(observer.signals().await, vec![SignalMessage::Answer(answer)]);
}

#[tokio::test]
async fn test_remote_offer_reuses_existing_connection() {
    init_tracing();

    let (engine, transport, _observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");

    engine.create_connection(&peer_id).await.unwrap();
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();

    assert_eq!(transport.created(), 1);
    assert_eq!(engine.snapshot().peers.len(), 1);
}

#[tokio::test]
async fn test_connected_after_transport_reports_it() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();

    transport
        .connection(0)
        .unwrap()
        .emit(TransportEvent::ConnectionStateChanged("connected".into()));

    let mut state = engine.subscribe();
    let connected = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        state.wait_for(|s| s.status_of(&peer_id) == Some(Status::Connected)),
    )
    .await
    .is_ok_and(|r| r.is_ok());
    assert!(connected, "Peer should be connected");

    assert!(
        observer
            .wait_for(
                |n| matches!(
                    n,
                    Notification::ConnectionState { status: Status::Connected, .. }
                ),
                1000
            )
            .await
    );
}

#[tokio::test]
async fn test_notifications_keep_transport_order() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();

    let connection = transport.connection(0).unwrap();
    for state in ["checking", "connected", "disconnected", "checking", "completed"] {
        connection.emit(TransportEvent::IceStateChanged(state.into()));
    }
    assert!(
        observer
            .wait_for(
                |n| matches!(n, Notification::IceState { state, .. } if state == "completed"),
                1000
            )
            .await
    );

    let ice_states: Vec<String> = observer
        .notifications_for(&peer_id)
        .await
        .into_iter()
        .filter_map(|n| match n {
            Notification::IceState { state, .. } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        ice_states,
        vec!["checking", "connected", "disconnected", "checking", "completed"]
    );
    assert_eq!(engine.snapshot().status_of(&peer_id), Some(Status::Connected));
}

#[tokio::test]
async fn test_renegotiation_keeps_peer_connected() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();
    transport
        .connection(0)
        .unwrap()
        .emit(TransportEvent::ConnectionStateChanged("connected".into()));

    engine
        .set_remote_offer(&remote_offer("u1", "y"))
        .await
        .expect("Renegotiation failed");

    assert_eq!(transport.created(), 1);
    assert_eq!(engine.snapshot().status_of(&peer_id), Some(Status::Connected));
    assert!(
        observer
            .wait_for(
                |n| matches!(
                    n,
                    Notification::ConnectionState { state, status: Status::Connected, .. }
                        if state == "stable"
                ),
                1000
            )
            .await
    );
}
