use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdcError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unable to decode row image: {0}")]
    Decode(#[from] serde_json::Error),
}
