use tether_core::{IceCandidate, TrackKind};

/// Notifications a transport connection pushes to its registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A local ICE candidate was gathered and must reach the remote side.
    CandidateGenerated(IceCandidate),

    SignalingStateChanged(String),

    IceStateChanged(String),

    /// Aggregate peer-connection state.
    ConnectionStateChanged(String),

    TrackAdded {
        id: String,
        stream_id: String,
        kind: TrackKind,
    },

    TrackRemoved { id: String },
}
