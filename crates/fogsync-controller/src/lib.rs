mod analytics;
mod cleanup;
mod controller;
mod definitions;
mod deployment;
mod error;
mod history;
mod incidents;
mod instances;
mod notification;
#[cfg(test)]
mod test_support;

pub use controller::Controller;
pub use error::ControllerError;
pub use incidents::{IncidentPolicy, IncidentSupervisor};
pub use notification::{Message, Notifier};
