//! Operator control channel
//!
//! Parses inbound commands, applies them to the shared state, the history
//! tracker or the chain, and replies through the messaging channel.

mod command;
mod interpreter;
mod polling_task;

pub use command::{Command, CommandError};
pub use interpreter::CommandInterpreter;
pub use polling_task::ControlLoop;
