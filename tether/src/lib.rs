pub use tether_core::model::PeerId;

pub mod model {
    pub use tether_core::model::*;
}

#[cfg(feature = "engine")]
pub mod engine {
    pub use tether_engine::*;
}
