//! Test doubles shared by the integration tests.


pub use mock_observer::*;
pub use mock_transport::*;
pub use signal_helpers::*;
