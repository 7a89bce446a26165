use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A remote media track received from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub peer_id: PeerId,
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

impl TrackRef {
    pub fn new(
        peer_id: PeerId,
        id: impl Into<String>,
        stream_id: impl Into<String>,
        kind: TrackKind,
    ) -> Self {
        Self {
            peer_id,
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
        }
    }
}
