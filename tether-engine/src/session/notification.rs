use crate::error::ErrorReport;
use tether_core::{PeerId, SignalMessage, Status, TrackRef};

/// What the engine tells the embedding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Forward this message to `to` over the application's signaling channel.
    Signal(SignalMessage),

    ConnectionState {
        peer_id: PeerId,
        state: String,
        status: Status,
    },

    IceState {
        peer_id: PeerId,
        state: String,
        status: Status,
    },

    TrackAdded(TrackRef),

    TrackRemoved { peer_id: PeerId },

    Error(ErrorReport),
}

impl Notification {
    pub fn peer_id(&self) -> Option<&PeerId> {
        match self {
            Notification::Signal(msg) => Some(msg.to()),
            Notification::ConnectionState { peer_id, .. }
            | Notification::IceState { peer_id, .. }
            | Notification::TrackRemoved { peer_id } => Some(peer_id),
            Notification::TrackAdded(track) => Some(&track.peer_id),
            Notification::Error(report) => report.peer_id.as_ref(),
        }
    }
}
