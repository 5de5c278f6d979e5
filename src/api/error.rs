use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Session context lacks a value the call site needs (tenant id, token, school id)
    #[error("missing session context: {0}")]
    MissingContext(&'static str),

    /// Request could not be sent or the response body could not be read
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
        body: String,
    },

    /// Response body did not have the expected `{ data: ... }` shape
    #[error("unexpected response shape from {url}: {detail}")]
    Envelope { url: String, detail: String },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Message fit for a feedback dialog: the server's own message when it
    /// sent one, a generic line otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Status { status, .. } => format!("Request failed with status {}", status),
            ApiError::MissingContext(what) => {
                format!("Your session is missing {}. Please sign in again.", what)
            }
            ApiError::Transport { .. } => "Could not reach the server. Please try again.".into(),
            ApiError::Envelope { .. } | ApiError::Json { .. } => {
                "The server sent an unexpected response.".into()
            }
        }
    }
}
