pub mod bridge;
pub mod config;
pub mod error;
pub mod executor;
pub mod registry;
pub mod session;
pub mod transport;

pub use bridge::{Event, EventBridge, Listener};
pub use config::{ConnectionConfig, EngineConfig, GatherPolicy};
pub use error::{EngineError, ErrorKind, ErrorReport, Result, TransportError};
pub use executor::{Command, CommandExecutor, CommandOutcome, CommandOutput};
pub use registry::ConnectionRegistry;
pub use session::{
    AggregateState, ChannelObserver, Engine, EngineHandle, Notification, Observer, PeerState,
    Reducer,
};
pub use transport::{
    PeerConnection, SdpKind, SessionDescription, Transport, TransportEvent, TransportHandler,
    WebRtcTransport,
};
