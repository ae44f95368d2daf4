mod api;
mod error;
mod registry;

pub use api::{build_app, serve};
pub use error::EventsError;
pub use registry::EventRegistry;
