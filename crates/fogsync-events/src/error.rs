use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("unable to bind event api: {0}")]
    Bind(std::io::Error),

    #[error("event api server error: {0}")]
    Serve(std::io::Error),
}
