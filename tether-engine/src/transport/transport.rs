use crate::config::ConnectionConfig;
use crate::error::TransportError;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::IceCandidate;

/// Callback registered with a connection at creation time.
///
/// Invoked synchronously, in emission order, for every notification of that
/// connection.
pub type TransportHandler = Arc<dyn Fn(TransportEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// One negotiated session with a remote peer.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Factory for peer connections. Passed to the engine explicitly so tests can
/// substitute their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn create_connection(
        &self,
        config: &ConnectionConfig,
        handler: TransportHandler,
    ) -> Result<Arc<dyn PeerConnection>, TransportError>;
}
