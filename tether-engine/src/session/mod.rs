mod engine;
mod notification;
mod observer;
mod reducer;
mod state;

pub use engine::*;
pub use notification::*;
pub use observer::*;
pub use reducer::*;
pub use state::*;
