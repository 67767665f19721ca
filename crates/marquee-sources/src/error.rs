use marquee_models::MovieId;

/// Failure talking to the remote movie API.
///
/// `Transient` failures may succeed when retried unchanged; `Permanent` ones
/// will not succeed until the input changes. Nothing here retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Transient fetch error: {0}")]
    Transient(String),

    #[error("Permanent fetch error: {message}")]
    Permanent { status: Option<u16>, message: String },

    #[error("Movie {0} not found")]
    NotFound(MovieId),
}

impl FetchError {
    /// Classify a non-success HTTP status.
    ///
    /// 5xx, 408 and 429 are retryable; every other 4xx is not.
    pub fn from_status(status: u16, detail: &str) -> Self {
        let message = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {} - {}", status, detail)
        };

        if status >= 500 || status == 408 || status == 429 {
            FetchError::Transient(message)
        } else {
            FetchError::Permanent { status: Some(status), message }
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        FetchError::Permanent { status: None, message: message.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Permanent { status, .. } => *status,
            FetchError::NotFound(_) => Some(404),
            FetchError::Transient(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::from_status(status.as_u16(), &e.to_string());
        }
        if e.is_decode() || e.is_builder() {
            return FetchError::malformed(e.to_string());
        }
        // Connect failures, timeouts, dropped connections
        FetchError::Transient(e.to_string())
    }
}
