use tether_core::{IceSignal, PeerId, SessionSignal};

/// Requests the application issues against its peer connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateConnection(PeerId),

    RemoveConnection(PeerId),

    CreateOffer(PeerId),

    /// Offer received from `from`; a connection is created if none exists.
    SetRemoteOffer(SessionSignal),

    SetRemoteAnswer(SessionSignal),

    AddIceCandidate(IceSignal),
}

impl Command {
    /// The remote peer this command concerns.
    pub fn peer_id(&self) -> &PeerId {
        match self {
            Command::CreateConnection(peer_id)
            | Command::RemoveConnection(peer_id)
            | Command::CreateOffer(peer_id) => peer_id,
            Command::SetRemoteOffer(signal) | Command::SetRemoteAnswer(signal) => &signal.from,
            Command::AddIceCandidate(signal) => &signal.from,
        }
    }
}

/// Result value of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Created,
    Removed,
    /// Offer to forward to the peer.
    Offer(SessionSignal),
    /// Answer to forward to the peer that sent the offer.
    Answer(SessionSignal),
    Applied,
}

/// State-relevant effect of a successful command, fed to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(PeerId),
    OfferCreated(PeerId),
    OfferAnswered(PeerId),
    AnswerApplied(PeerId),
}

impl CommandOutcome {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            CommandOutcome::Created(peer_id)
            | CommandOutcome::OfferCreated(peer_id)
            | CommandOutcome::OfferAnswered(peer_id)
            | CommandOutcome::AnswerApplied(peer_id) => peer_id,
        }
    }
}
