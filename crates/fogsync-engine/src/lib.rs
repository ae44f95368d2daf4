pub mod bpmn;
mod client;
mod error;
pub mod templates;

pub use client::{EngineClient, HistoryFilter};
pub use error::{BpmnError, EngineError};
