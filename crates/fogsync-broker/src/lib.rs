mod client;
mod command;
mod error;
mod sink;
pub mod topics;

pub use client::{BrokerClient, BrokerConfig};
pub use command::Command;
pub use error::BrokerError;
pub use sink::StateSink;
pub use topics::Topics;
