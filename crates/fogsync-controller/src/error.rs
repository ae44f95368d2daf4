use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Engine(#[from] fogsync_engine::EngineError),

    #[error(transparent)]
    Bpmn(#[from] fogsync_engine::BpmnError),

    #[error(transparent)]
    Store(#[from] fogsync_store::StoreError),

    #[error(transparent)]
    Broker(#[from] fogsync_broker::BrokerError),

    #[error(transparent)]
    Cdc(#[from] fogsync_cdc::CdcError),

    #[error(transparent)]
    Config(#[from] fogsync_config::ConfigError),

    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no definition for deployment found: {0}")]
    NoDefinitionForDeployment(String),
}
