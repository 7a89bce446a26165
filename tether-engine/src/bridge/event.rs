use crate::error::ErrorReport;
use tether_core::{IceCandidate, PeerId, TrackRef};

/// Everything the engine learns about its connections, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OfferGenerated { sdp: String, peer_id: PeerId },

    AnswerGenerated { sdp: String, peer_id: PeerId },

    IceCandidateGenerated { candidate: IceCandidate, peer_id: PeerId },

    /// Peer-connection state, as raw transport text.
    ConnectionStateChanged { state: String, peer_id: PeerId },

    /// Signaling state, as raw transport text.
    SignalingStateChanged { state: String, peer_id: PeerId },

    IceStateChanged { state: String, peer_id: PeerId },

    TrackAdded { track: TrackRef },

    TrackRemoved { peer_id: PeerId },

    ErrorOccurred(ErrorReport),
}

impl Event {
    pub fn peer_id(&self) -> Option<&PeerId> {
        match self {
            Event::OfferGenerated { peer_id, .. }
            | Event::AnswerGenerated { peer_id, .. }
            | Event::IceCandidateGenerated { peer_id, .. }
            | Event::ConnectionStateChanged { peer_id, .. }
            | Event::SignalingStateChanged { peer_id, .. }
            | Event::IceStateChanged { peer_id, .. }
            | Event::TrackRemoved { peer_id } => Some(peer_id),
            Event::TrackAdded { track } => Some(&track.peer_id),
            Event::ErrorOccurred(report) => report.peer_id.as_ref(),
        }
    }
}
