use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported server URL scheme \"{0}\" (use http or https)")]
    UnsupportedScheme(String),

    #[error("client token is not a valid header value")]
    InvalidToken,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("gotify returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("no websocket traffic for {0:?}, assuming the connection is dead")]
    IdleTimeout(std::time::Duration),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl herald_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

herald_common::impl_context!();
