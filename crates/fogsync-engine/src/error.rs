use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unable to interpret engine deployment response: {0}")]
    UnexpectedResponse(serde_json::Value),

    #[error("engine rejected the process deployment and the blank fallback")]
    DeployRejected,
}

#[derive(Debug, Error)]
pub enum BpmnError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("xml output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("non-utf8 content in xml: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("non-utf8 xml document: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),
}
