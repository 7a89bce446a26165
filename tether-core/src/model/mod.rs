mod peer;
mod signaling;
mod status;
mod track;

pub use peer::PeerId;
pub use signaling::{IceCandidate, IceServerConfig, IceSignal, SessionSignal, SignalMessage};
pub use status::Status;
pub use track::{TrackKind, TrackRef};
