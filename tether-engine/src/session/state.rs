use crate::error::ErrorReport;
use serde::Serialize;
use std::collections::BTreeMap;
use tether_core::{PeerId, Status, TrackRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerState {
    pub id: PeerId,
    pub connection_status: Status,
    pub track: Option<TrackRef>,
}

impl PeerState {
    pub fn new(id: PeerId) -> Self {
        Self::with_status(id, Status::New)
    }

    pub fn with_status(id: PeerId, connection_status: Status) -> Self {
        Self {
            id,
            connection_status,
            track: None,
        }
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }
}

/// Everything the engine knows, as a read-only snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    pub peers: BTreeMap<PeerId, PeerState>,
    pub listening: bool,
    pub last_error: Option<ErrorReport>,
}

impl AggregateState {
    pub fn peer(&self, peer_id: &PeerId) -> Option<&PeerState> {
        self.peers.get(peer_id)
    }

    pub fn status_of(&self, peer_id: &PeerId) -> Option<Status> {
        self.peer(peer_id).map(|p| p.connection_status)
    }
}
