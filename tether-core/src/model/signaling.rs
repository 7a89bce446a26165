use crate::model::peer::PeerId;
use crate::utils::DEFAULT_STUN_ADDRS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }

    /// Single entry holding the default public STUN servers.
    pub fn public_stun() -> Vec<Self> {
        vec![Self::stun(DEFAULT_STUN_ADDRS)]
    }
}

/// A trickled ICE candidate as exchanged with the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: u16,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
}

/// SDP payload travelling between two peers (offer or answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSignal {
    pub sdp: String,
    pub from: PeerId,
    pub to: PeerId,
    #[serde(rename = "videoSource", default)]
    pub video_source: String,
}

impl SessionSignal {
    pub fn new(sdp: impl Into<String>, from: PeerId, to: PeerId) -> Self {
        Self {
            sdp: sdp.into(),
            from,
            to,
            video_source: String::new(),
        }
    }

    pub fn with_video_source(mut self, video_source: impl Into<String>) -> Self {
        self.video_source = video_source.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceSignal {
    pub from: PeerId,
    pub to: PeerId,
    pub candidate: IceCandidate,
}

/// Messages the application ships over its own signaling channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalMessage {
    Offer(SessionSignal),
    Answer(SessionSignal),
    Ice(IceSignal),
}

impl SignalMessage {
    pub fn from(&self) -> &PeerId {
        match self {
            SignalMessage::Offer(s) | SignalMessage::Answer(s) => &s.from,
            SignalMessage::Ice(s) => &s.from,
        }
    }

    pub fn to(&self) -> &PeerId {
        match self {
            SignalMessage::Offer(s) | SignalMessage::Answer(s) => &s.to,
            SignalMessage::Ice(s) => &s.to,
        }
    }
}
