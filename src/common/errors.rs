use thiserror::Error;

/// Errors raised while fetching, notifying or persisting state.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed could not be parsed: {0}")]
    Feed(#[from] rss::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}
