mod command;
mod command_executor;

pub use command::*;
pub use command_executor::*;
