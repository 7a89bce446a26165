use tether_core::{IceCandidate, PeerId, SignalMessage};
use tether_engine::{ErrorKind, TransportEvent};

use crate::integration::{create_listening_engine, init_tracing};
use crate::utils::{Step, remote_candidate, remote_offer};

#[tokio::test]
async fn test_remote_candidate_is_applied() {
    init_tracing();

    let (engine, transport, _observer) = create_listening_engine().await;
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();

    engine
        .add_ice_candidate(&remote_candidate("u1", "candidate:1"))
        .await
        .expect("Candidate failed");

    let candidates = transport.connection(0).unwrap().candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].candidate, "candidate:1");
}

#[tokio::test]
async fn test_local_candidate_is_forwarded_as_signal() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    let peer_id = PeerId::from("u1");
    engine.create_connection(&peer_id).await.unwrap();

    let candidate = IceCandidate {
        candidate: "candidate:7".into(),
        sdp_mline_index: 1,
        sdp_mid: Some("1".into()),
    };
    transport
        .connection(0)
        .unwrap()
        .emit(TransportEvent::CandidateGenerated(candidate.clone()));

    assert!(
        observer
            .wait_for(|n| matches!(n, tether_engine::Notification::Signal(_)), 1000)
            .await
    );
    let signals = observer.signals().await;
    let SignalMessage::Ice(ice) = &signals[0] else {
        panic!("expected an ICE signal, got {:?}", signals[0]);
    };
    assert_eq!(ice.from, PeerId::from("local"));
    assert_eq!(ice.to, peer_id);
    assert_eq!(ice.candidate, candidate);

    let json = serde_json::to_value(&signals[0]).unwrap();
    assert_eq!(json["type"], "ice");
    assert_eq!(json["candidate"]["sdpMLineIndex"], 1);
}

#[tokio::test]
async fn test_candidate_failure_is_reported() {
    init_tracing();

    let (engine, transport, observer) = create_listening_engine().await;
    engine
        .set_remote_offer(&remote_offer("u1", "x"))
        .await
        .unwrap();
    transport.fail(Step::AddCandidate);

    let err = engine
        .add_ice_candidate(&remote_candidate("u1", "candidate:1"))
        .await
        .expect_err("Candidate should fail");

    assert_eq!(err.kind(), Some(ErrorKind::CandidateAddFailed));
    assert!(observer.wait_for_errors(1, 1000).await);
    assert_eq!(observer.errors().await[0].kind, ErrorKind::CandidateAddFailed);
}
