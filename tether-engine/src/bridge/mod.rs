mod event;
mod event_bridge;

pub use event::*;
pub use event_bridge::*;
