use serde::{Deserialize, Serialize};
use std::time::Duration;
use tether_core::{IceServerConfig, PeerId};

/// ICE candidate gathering policy requested for new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatherPolicy {
    Once,
    Continually,
}

/// Settings applied to every peer connection the registry creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub gather_policy: GatherPolicy,
    pub receive_audio: bool,
    pub receive_video: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServerConfig::public_stun(),
            gather_policy: GatherPolicy::Continually,
            receive_audio: true,
            receive_video: true,
        }
    }
}

/// Engine configuration, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Id this side uses as `from` in outgoing signals.
    pub local_id: PeerId,
    /// Free-form label copied into offers and answers.
    pub video_source: String,
    pub connection: ConnectionConfig,
    /// Upper bound for a single transport operation. Unbounded when absent.
    pub operation_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_id: PeerId::random(),
            video_source: "camera".to_owned(),
            connection: ConnectionConfig::default(),
            operation_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn new(local_id: impl Into<PeerId>) -> Self {
        Self {
            local_id: local_id.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}
