use crate::bridge::Event;
use crate::executor::CommandOutcome;
use crate::session::{AggregateState, Notification, PeerState};
use tether_core::{IceSignal, PeerId, SessionSignal, SignalMessage, Status};
use tracing::debug;

/// Deterministic state machine behind the engine.
///
/// Mirrors whatever the transport reports on the connection and ICE layers; no
/// status transition is refused there. Signaling states only move a peer out
/// of `New` or into `Closed`, since renegotiation on a live connection passes
/// through them.
pub struct Reducer {
    state: AggregateState,
    local_id: PeerId,
    video_source: String,
}

impl Reducer {
    pub fn new(local_id: PeerId, video_source: impl Into<String>) -> Self {
        Self {
            state: AggregateState::default(),
            local_id,
            video_source: video_source.into(),
        }
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    /// Returns true if the flag changed.
    pub fn set_listening(&mut self, listening: bool) -> bool {
        let changed = self.state.listening != listening;
        self.state.listening = listening;
        changed
    }

    pub fn apply(&mut self, event: Event) -> Vec<Notification> {
        let notification = match event {
            Event::OfferGenerated { sdp, peer_id } => {
                Notification::Signal(SignalMessage::Offer(self.session_signal(sdp, peer_id)))
            }

            Event::AnswerGenerated { sdp, peer_id } => {
                Notification::Signal(SignalMessage::Answer(self.session_signal(sdp, peer_id)))
            }

            Event::IceCandidateGenerated { candidate, peer_id } => {
                Notification::Signal(SignalMessage::Ice(IceSignal {
                    from: self.local_id.clone(),
                    to: peer_id,
                    candidate,
                }))
            }

            Event::ConnectionStateChanged { state, peer_id } => {
                let status = self.mirror_status(&peer_id, &state);
                Notification::ConnectionState {
                    peer_id,
                    state,
                    status,
                }
            }

            Event::SignalingStateChanged { state, peer_id } => {
                let status = self.signaling_status(&peer_id, &state);
                Notification::ConnectionState {
                    peer_id,
                    state,
                    status,
                }
            }

            Event::IceStateChanged { state, peer_id } => {
                let status = self.mirror_status(&peer_id, &state);
                Notification::IceState {
                    peer_id,
                    state,
                    status,
                }
            }

            Event::TrackAdded { track } => {
                self.state
                    .peers
                    .entry(track.peer_id.clone())
                    .and_modify(|peer| {
                        peer.track = Some(track.clone());
                        peer.connection_status = Status::Connected;
                    })
                    .or_insert_with(|| PeerState {
                        id: track.peer_id.clone(),
                        connection_status: Status::Connected,
                        track: Some(track.clone()),
                    });
                Notification::TrackAdded(track)
            }

            Event::TrackRemoved { peer_id } => {
                if let Some(peer) = self.state.peers.get_mut(&peer_id) {
                    peer.track = None;
                    peer.connection_status = Status::Disconnected;
                }
                Notification::TrackRemoved { peer_id }
            }

            Event::ErrorOccurred(report) => {
                self.state.last_error = Some(report.clone());
                Notification::Error(report)
            }
        };

        vec![notification]
    }

    /// Records the effect of a successful command.
    pub fn complete(&mut self, outcome: &CommandOutcome) {
        let peer_id = outcome.peer_id();
        match outcome {
            CommandOutcome::Created(_) => {
                self.state
                    .peers
                    .entry(peer_id.clone())
                    .or_insert_with(|| PeerState::new(peer_id.clone()));
            }
            CommandOutcome::OfferCreated(_)
            | CommandOutcome::OfferAnswered(_)
            | CommandOutcome::AnswerApplied(_) => {
                let peer = self
                    .state
                    .peers
                    .entry(peer_id.clone())
                    .or_insert_with(|| PeerState::with_status(peer_id.clone(), Status::Connecting));
                if peer.connection_status == Status::New {
                    peer.connection_status = Status::Connecting;
                }
            }
        }
    }

    /// Drops the peer's state after its connection was removed.
    pub fn forget(&mut self, peer_id: &PeerId) -> bool {
        self.state.peers.remove(peer_id).is_some()
    }

    fn mirror_status(&mut self, peer_id: &PeerId, state: &str) -> Status {
        let status = Status::from_transport(state);
        match self.state.peers.get_mut(peer_id) {
            Some(peer) => peer.connection_status = status,
            None => debug!("State '{}' for unknown peer {} not applied", state, peer_id),
        }
        status
    }

    fn signaling_status(&mut self, peer_id: &PeerId, state: &str) -> Status {
        let status = Status::from_transport(state);
        let Some(peer) = self.state.peers.get_mut(peer_id) else {
            debug!("Signaling state '{}' for unknown peer {} not applied", state, peer_id);
            return status;
        };
        if peer.connection_status == Status::New || status == Status::Closed {
            peer.connection_status = status;
        }
        peer.connection_status
    }

    fn session_signal(&self, sdp: String, peer_id: PeerId) -> SessionSignal {
        SessionSignal::new(sdp, self.local_id.clone(), peer_id)
            .with_video_source(self.video_source.clone())
    }
}
