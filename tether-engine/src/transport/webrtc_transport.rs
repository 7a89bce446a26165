use crate::config::{ConnectionConfig, GatherPolicy};
use crate::error::{EngineError, TransportError};
use crate::transport::{
    PeerConnection, SdpKind, SessionDescription, Transport, TransportEvent, TransportHandler,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tether_core::{IceCandidate, TrackKind};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_remote::TrackRemote;

/// [`Transport`] backed by the `webrtc` crate.
pub struct WebRtcTransport {
    api: API,
}

impl WebRtcTransport {
    /// Registers the default codecs and interceptors once for all connections.
    pub fn new() -> Result<Self, EngineError> {
        Self::build().map_err(|source| EngineError::TransportInitFailed {
            peer_id: None,
            source,
        })
    }

    fn build() -> Result<Self, TransportError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api })
    }
}

#[async_trait]
impl Transport for WebRtcTransport {
    async fn create_connection(
        &self,
        config: &ConnectionConfig,
        handler: TransportHandler,
    ) -> Result<Arc<dyn PeerConnection>, TransportError> {
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(self.api.new_peer_connection(rtc_config).await?);

        let receive_only = || RTCRtpTransceiverInit {
            direction: RTCRtpTransceiverDirection::Recvonly,
            send_encodings: vec![],
        };
        if config.receive_audio {
            peer_connection
                .add_transceiver_from_kind(RTPCodecType::Audio, Some(receive_only()))
                .await?;
        }
        if config.receive_video {
            peer_connection
                .add_transceiver_from_kind(RTPCodecType::Video, Some(receive_only()))
                .await?;
        }

        let ice_handler = handler.clone();
        let gate = CandidateGate::new(config.gather_policy);
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            match c.map(|c| c.to_json()).transpose() {
                Ok(init) => {
                    if let Some(candidate) = gate.admit(init) {
                        ice_handler(TransportEvent::CandidateGenerated(candidate));
                    }
                }
                Err(e) => warn!("Skipping local candidate that cannot be serialized: {}", e),
            }
            Box::pin(async {})
        }));

        let signaling_handler = handler.clone();
        peer_connection.on_signaling_state_change(Box::new(move |s: RTCSignalingState| {
            signaling_handler(TransportEvent::SignalingStateChanged(s.to_string()));
            Box::pin(async {})
        }));

        let ice_state_handler = handler.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                ice_state_handler(TransportEvent::IceStateChanged(s.to_string()));
                Box::pin(async {})
            },
        ));

        let state_handler = handler.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                info!("Peer connection state changed: {}", s);
                state_handler(TransportEvent::ConnectionStateChanged(s.to_string()));
                Box::pin(async {})
            },
        ));

        let track_handler = handler;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let id = track.id();
                track_handler(TransportEvent::TrackAdded {
                    id: id.clone(),
                    stream_id: track.stream_id(),
                    kind,
                });

                // webrtc-rs has no track-removed callback; the track ends when reads fail.
                let handler = track_handler.clone();
                tokio::spawn(async move {
                    while track.read_rtp().await.is_ok() {}
                    debug!("Remote track {} ended", id);
                    handler(TransportEvent::TrackRemoved { id });
                });

                Box::pin(async {})
            },
        ));

        Ok(Arc::new(WebRtcConnection { peer_connection }))
    }
}

/// Decides which locally gathered candidates are forwarded.
///
/// Gathering ends when the transport reports no candidate. Under
/// [`GatherPolicy::Once`] candidates from any later gathering round, such as
/// after an ICE restart, are dropped.
struct CandidateGate {
    policy: GatherPolicy,
    complete: AtomicBool,
}

impl CandidateGate {
    fn new(policy: GatherPolicy) -> Self {
        Self {
            policy,
            complete: AtomicBool::new(false),
        }
    }

    fn admit(&self, init: Option<RTCIceCandidateInit>) -> Option<IceCandidate> {
        let Some(init) = init else {
            debug!("Local candidate gathering complete");
            self.complete.store(true, Ordering::SeqCst);
            return None;
        };
        if self.policy == GatherPolicy::Once && self.complete.load(Ordering::SeqCst) {
            debug!("Gathering already complete, dropping candidate {}", init.candidate);
            return None;
        }
        Some(from_rtc_candidate(init))
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mline_index: init.sdp_mline_index.unwrap_or_default(),
        sdp_mid: init.sdp_mid,
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, TransportError> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

pub struct WebRtcConnection {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerConnection for WebRtcConnection {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: Some(candidate.sdp_mline_index),
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
