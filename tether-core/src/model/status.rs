use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection status of a peer as mirrored from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl Status {
    /// Collapses a textual signaling, ICE or peer-connection state into a status.
    ///
    /// Unrecognized states map to [`Status::Disconnected`].
    pub fn from_transport(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "new" => Status::New,
            "connecting"
            | "checking"
            | "stable"
            | "have-local-offer"
            | "have-remote-offer"
            | "have-local-pranswer"
            | "have-remote-pranswer" => Status::Connecting,
            "connected" | "completed" => Status::Connected,
            "disconnected" => Status::Disconnected,
            "failed" => Status::Failed,
            "closed" => Status::Closed,
            _ => Status::Disconnected,
        }
    }

    pub fn is_connected(self) -> bool {
        self == Status::Connected
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::New => "new",
            Status::Connecting => "connecting",
            Status::Connected => "connected",
            Status::Disconnected => "disconnected",
            Status::Failed => "failed",
            Status::Closed => "closed",
        };
        f.write_str(text)
    }
}
