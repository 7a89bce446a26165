mod transport;
mod transport_event;
mod webrtc_transport;

pub use transport::*;
pub use transport_event::*;
pub use webrtc_transport::*;
