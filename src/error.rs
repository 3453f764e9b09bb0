/// Why a request produced no usable result.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// `reqwest` could not complete the attempt: connect failure, timeout or body read.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Transport-level failure reported by a custom [`Transport`](crate::Transport).
    #[error("connection failed: {0}")]
    Connection(String),
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// Error status turned into an error by [`Response::error_for_status`](crate::Response::error_for_status).
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body was not the JSON shape the caller asked for.
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid client or environment configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl RequestError {
    /// Returns `true` when no response was obtained and the attempt may be retried.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Connection(_))
    }
}
