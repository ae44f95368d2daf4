use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid broker url '{0}'")]
    InvalidBrokerUrl(String),

    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("payload encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("message on unexpected topic '{0}'")]
    UnknownTopic(String),

    #[error("non-utf8 payload on topic '{0}'")]
    Payload(String),
}
