use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tether_core::PeerId;

/// Failure categories reported to callers and published as `ErrorOccurred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConnectionNotFound,
    OfferCreationFailed,
    AnswerCreationFailed,
    DescriptionSetFailed,
    CandidateAddFailed,
    TransportInitFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors raised by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no connection for peer {0}")]
    ConnectionNotFound(PeerId),

    #[error("offer creation failed for peer {peer_id}: {source}")]
    OfferCreationFailed {
        peer_id: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("answer creation failed for peer {peer_id}: {source}")]
    AnswerCreationFailed {
        peer_id: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("setting session description failed for peer {peer_id}: {source}")]
    DescriptionSetFailed {
        peer_id: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("adding ICE candidate failed for peer {peer_id}: {source}")]
    CandidateAddFailed {
        peer_id: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("transport initialization failed{}: {source}", peer_suffix(.peer_id))]
    TransportInitFailed {
        peer_id: Option<PeerId>,
        #[source]
        source: TransportError,
    },

    #[error("engine is stopped")]
    Stopped,
}

fn peer_suffix(peer_id: &Option<PeerId>) -> String {
    peer_id
        .as_ref()
        .map(|id| format!(" for peer {}", id))
        .unwrap_or_default()
}

impl EngineError {
    /// Category of the failure. `None` only for [`EngineError::Stopped`].
    pub fn kind(&self) -> Option<ErrorKind> {
        let kind = match self {
            EngineError::ConnectionNotFound(_) => ErrorKind::ConnectionNotFound,
            EngineError::OfferCreationFailed { .. } => ErrorKind::OfferCreationFailed,
            EngineError::AnswerCreationFailed { .. } => ErrorKind::AnswerCreationFailed,
            EngineError::DescriptionSetFailed { .. } => ErrorKind::DescriptionSetFailed,
            EngineError::CandidateAddFailed { .. } => ErrorKind::CandidateAddFailed,
            EngineError::TransportInitFailed { .. } => ErrorKind::TransportInitFailed,
            EngineError::Stopped => return None,
        };
        Some(kind)
    }

    pub fn peer_id(&self) -> Option<&PeerId> {
        match self {
            EngineError::ConnectionNotFound(peer_id)
            | EngineError::OfferCreationFailed { peer_id, .. }
            | EngineError::AnswerCreationFailed { peer_id, .. }
            | EngineError::DescriptionSetFailed { peer_id, .. }
            | EngineError::CandidateAddFailed { peer_id, .. } => Some(peer_id),
            EngineError::TransportInitFailed { peer_id, .. } => peer_id.as_ref(),
            EngineError::Stopped => None,
        }
    }

    /// Report published on the event stream, if this error is reportable.
    pub fn report(&self) -> Option<ErrorReport> {
        Some(ErrorReport {
            kind: self.kind()?,
            peer_id: self.peer_id().cloned(),
            message: self.to_string(),
        })
    }
}

/// Error as recorded in the aggregate state and carried by `ErrorOccurred`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub peer_id: Option<PeerId>,
    pub message: String,
}
