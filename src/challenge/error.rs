use thiserror::Error;

pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum ChallengeApiError {
    /// No HTTP response: connect failure, timeout, too many redirects.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API key header: {0}")]
    InvalidKey(String),

    /// The partner answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        body: String,
    },
}

impl ChallengeApiError {
    pub fn from_status_code(status: u16, body: String) -> Self {
        ChallengeApiError::Rejected {
            status,
            message: extract_message(&body),
            body,
        }
    }

    /// True when no HTTP response was received.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChallengeApiError::Transport(_) | ChallengeApiError::InvalidKey(_)
        )
    }

    /// Text for the order note.
    pub fn note_message(&self) -> String {
        match self {
            ChallengeApiError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Best-effort `message` field of a JSON error body.
pub fn extract_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return UNKNOWN_ERROR.to_string(),
    };

    match value.get("message") {
        Some(serde_json::Value::String(message)) if !message.is_empty() => message.clone(),
        Some(serde_json::Value::Null) | None => UNKNOWN_ERROR.to_string(),
        Some(serde_json::Value::String(_)) => UNKNOWN_ERROR.to_string(),
        Some(other) => other.to_string(),
    }
}
