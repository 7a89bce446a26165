use crate::bridge::{Event, EventBridge};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, TransportError};
use crate::executor::{Command, CommandOutcome, CommandOutput};
use crate::registry::ConnectionRegistry;
use crate::transport::SessionDescription;
use std::future::Future;
use std::time::Duration;
use tether_core::{IceSignal, PeerId, SessionSignal};
use tracing::{debug, info, warn};

/// Runs commands against the transport through the registry.
///
/// Every failure is returned to the caller and also published as
/// `ErrorOccurred`. Successful outcomes are published while the peer's
/// registry slot is still held, so they queue in the same order the
/// operations ran.
#[derive(Clone)]
pub struct CommandExecutor {
    registry: ConnectionRegistry,
    bridge: EventBridge,
    local_id: PeerId,
    video_source: String,
    timeout: Option<Duration>,
}

impl CommandExecutor {
    pub fn new(registry: ConnectionRegistry, bridge: EventBridge, config: &EngineConfig) -> Self {
        Self {
            registry,
            bridge,
            local_id: config.local_id.clone(),
            video_source: config.video_source.clone(),
            timeout: config.operation_timeout(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutput> {
        debug!("Executing {:?}", command);
        match command {
            Command::CreateConnection(peer_id) => self
                .create_connection(&peer_id)
                .await
                .map(|_| CommandOutput::Created),
            Command::RemoveConnection(peer_id) => {
                self.remove_connection(&peer_id).await;
                Ok(CommandOutput::Removed)
            }
            Command::CreateOffer(peer_id) => {
                self.create_offer(&peer_id).await.map(CommandOutput::Offer)
            }
            Command::SetRemoteOffer(offer) => self
                .set_remote_offer(&offer)
                .await
                .map(CommandOutput::Answer),
            Command::SetRemoteAnswer(answer) => self
                .set_remote_answer(&answer)
                .await
                .map(|_| CommandOutput::Applied),
            Command::AddIceCandidate(candidate) => self
                .add_ice_candidate(&candidate)
                .await
                .map(|_| CommandOutput::Applied),
        }
    }

    pub async fn create_connection(&self, peer_id: &PeerId) -> Result<()> {
        let result = async {
            let mut lock = self.registry.lock(peer_id).await;
            self.registry
                .create_locked(&mut lock)
                .await
                .map_err(|source| EngineError::TransportInitFailed {
                    peer_id: Some(peer_id.clone()),
                    source,
                })?;
            self.bridge
                .completed(CommandOutcome::Created(peer_id.clone()));
            Ok::<_, EngineError>(())
        }
        .await;
        self.report(result)
    }

    pub async fn remove_connection(&self, peer_id: &PeerId) {
        self.registry.remove(peer_id).await;
    }

    /// Generates an offer, commits it locally and returns it ready to send.
    pub async fn create_offer(&self, peer_id: &PeerId) -> Result<SessionSignal> {
        let result = self.try_create_offer(peer_id).await;
        self.report(result).map(|sdp| self.signal(sdp, peer_id))
    }

    async fn try_create_offer(&self, peer_id: &PeerId) -> Result<String> {
        let failed = |source| EngineError::OfferCreationFailed {
            peer_id: peer_id.clone(),
            source,
        };

        let lock = self.registry.lock(peer_id).await;
        let connection = lock
            .connection()
            .ok_or_else(|| EngineError::ConnectionNotFound(peer_id.clone()))?;

        let offer = self.bounded(connection.create_offer()).await.map_err(failed)?;
        self.bounded(connection.set_local_description(offer.clone()))
            .await
            .map_err(failed)?;

        info!("Offer created for {}", peer_id);
        self.bridge.publish(Event::OfferGenerated {
            sdp: offer.sdp.clone(),
            peer_id: peer_id.clone(),
        });
        self.bridge
            .completed(CommandOutcome::OfferCreated(peer_id.clone()));
        Ok(offer.sdp)
    }

    /// Applies a remote offer and returns the answer for its sender.
    ///
    /// Creates the connection first if the sender is unknown.
    pub async fn set_remote_offer(&self, offer: &SessionSignal) -> Result<SessionSignal> {
        let result = self.try_set_remote_offer(offer).await;
        self.report(result).map(|sdp| self.signal(sdp, &offer.from))
    }

    async fn try_set_remote_offer(&self, offer: &SessionSignal) -> Result<String> {
        let peer_id = &offer.from;
        let described = |source| EngineError::DescriptionSetFailed {
            peer_id: peer_id.clone(),
            source,
        };

        let mut lock = self.registry.lock(peer_id).await;
        self.registry
            .create_locked(&mut lock)
            .await
            .map_err(described)?;
        // The handle exists from here on, even if negotiation fails below.
        self.bridge
            .completed(CommandOutcome::Created(peer_id.clone()));
        let connection = lock
            .connection()
            .ok_or_else(|| EngineError::ConnectionNotFound(peer_id.clone()))?;

        self.bounded(connection.set_remote_description(SessionDescription::offer(offer.sdp.clone())))
            .await
            .map_err(described)?;
        let answer = self
            .bounded(connection.create_answer())
            .await
            .map_err(|source| EngineError::AnswerCreationFailed {
                peer_id: peer_id.clone(),
                source,
            })?;
        self.bounded(connection.set_local_description(answer.clone()))
            .await
            .map_err(described)?;

        info!("Answer created for {}", peer_id);
        self.bridge.publish(Event::AnswerGenerated {
            sdp: answer.sdp.clone(),
            peer_id: peer_id.clone(),
        });
        self.bridge
            .completed(CommandOutcome::OfferAnswered(peer_id.clone()));
        Ok(answer.sdp)
    }

    pub async fn set_remote_answer(&self, answer: &SessionSignal) -> Result<()> {
        let peer_id = &answer.from;
        let result = async {
            let lock = self.registry.lock(peer_id).await;
            let connection = lock
                .connection()
                .ok_or_else(|| EngineError::ConnectionNotFound(peer_id.clone()))?;

            self.bounded(connection.set_remote_description(SessionDescription::answer(
                answer.sdp.clone(),
            )))
            .await
            .map_err(|source| EngineError::DescriptionSetFailed {
                peer_id: peer_id.clone(),
                source,
            })?;

            info!("Remote answer applied for {}", peer_id);
            self.bridge
                .completed(CommandOutcome::AnswerApplied(peer_id.clone()));
            Ok::<_, EngineError>(())
        }
        .await;
        self.report(result)
    }

    pub async fn add_ice_candidate(&self, signal: &IceSignal) -> Result<()> {
        let peer_id = &signal.from;
        let result = async {
            let lock = self.registry.lock(peer_id).await;
            let connection = lock
                .connection()
                .ok_or_else(|| EngineError::ConnectionNotFound(peer_id.clone()))?;

            self.bounded(connection.add_ice_candidate(signal.candidate.clone()))
                .await
                .map_err(|source| EngineError::CandidateAddFailed {
                    peer_id: peer_id.clone(),
                    source,
                })?;

            debug!("ICE candidate added for {}", peer_id);
            Ok::<_, EngineError>(())
        }
        .await;
        self.report(result)
    }

    fn signal(&self, sdp: String, peer_id: &PeerId) -> SessionSignal {
        SessionSignal::new(sdp, self.local_id.clone(), peer_id.clone())
            .with_video_source(self.video_source.clone())
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, TransportError>>,
    ) -> std::result::Result<T, TransportError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .unwrap_or(Err(TransportError::TimedOut(limit))),
            None => op.await,
        }
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("Command failed: {}", e);
            if let Some(report) = e.report() {
                self.bridge.publish(Event::ErrorOccurred(report));
            }
        }
        result
    }
}
