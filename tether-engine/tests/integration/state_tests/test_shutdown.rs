use tether_core::PeerId;
use tether_engine::{EngineError, Notification};

use crate::integration::{create_listening_engine, init_tracing};

#[tokio::test]
async fn test_shutdown_closes_every_connection() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    for id in ["u1", "u2", "u3"] {
        engine.create_connection(&PeerId::from(id)).await.unwrap();
    }

    engine.shutdown().await.expect("Shutdown failed");

    for i in 0..3 {
        assert!(transport.connection(i).unwrap().is_closed());
    }
    assert!(engine.registry().is_empty().await);
    assert!(engine.snapshot().peers.is_empty());

    // Delivery outlives the engine task.
    assert!(
        observer
            .wait_for_count(|n| matches!(n, Notification::TrackRemoved { .. }), 3, 1000)
            .await
    );
    let removed = observer
        .notifications()
        .await
        .into_iter()
        .filter(|n| matches!(n, Notification::TrackRemoved { .. }))
        .count();
    assert_eq!(removed, 3);
}

#[tokio::test]
async fn test_commands_fail_after_shutdown() {
    init_tracing();

    let (engine, transport, _observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine.shutdown().await.unwrap();

    assert!(!engine.is_running());
    assert!(matches!(
        engine.create_connection(&peer_id).await,
        Err(EngineError::Stopped)
    ));
    assert!(matches!(
        engine.start_listening().await,
        Err(EngineError::Stopped)
    ));
    assert!(matches!(engine.shutdown().await, Err(EngineError::Stopped)));
    assert_eq!(transport.created(), 0);
}

#[tokio::test]
async fn test_stopped_error_is_not_published() {
    init_tracing();

    let (engine, _transport, observer) = create_listening_engine().await;
    let handle = engine.clone();
    engine.shutdown().await.unwrap();

    assert!(handle.create_offer(&PeerId::from("u1")).await.is_err());
    assert!(observer.errors().await.is_empty());
}
