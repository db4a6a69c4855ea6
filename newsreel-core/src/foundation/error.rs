/// Convenience result type used across newsreel.
pub type NewsreelResult<T> = Result<T, NewsreelError>;

/// Top-level error taxonomy used by pipeline stages.
#[derive(thiserror::Error, Debug)]
pub enum NewsreelError {
    /// Network or HTTP failure while fetching a remote resource.
    #[error("fetch error: {message}")]
    Fetch {
        /// Human-readable description.
        message: String,
        /// Whether a retry may succeed (timeouts, 5xx, 429).
        retryable: bool,
    },

    /// Unsupported or corrupt media bytes.
    #[error("decode error: {0}")]
    Decode(String),

    /// Summarization/translation backend unavailable or erroring.
    #[error("service error: {0}")]
    Service(String),

    /// Text-to-speech backend failure.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// A required input was missing or empty.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Inputs were present but produce no usable output (e.g. zero-length schedule).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Compositing or frame persistence failure.
    #[error("render error: {0}")]
    Render(String),

    /// External encoder failure, carrying its diagnostic output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NewsreelError {
    /// Build a non-retryable [`NewsreelError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Build a retryable [`NewsreelError::Fetch`] value.
    pub fn fetch_retryable(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Build a [`NewsreelError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`NewsreelError::Service`] value.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Build a [`NewsreelError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`NewsreelError::EmptyInput`] value.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Build a [`NewsreelError::DegenerateInput`] value.
    pub fn degenerate_input(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    /// Build a [`NewsreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NewsreelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`NewsreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the failure looks transient. Consulted by a [`crate::RetryPolicy`] with
    /// `transient_only` set.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch {
                retryable: true,
                ..
            }
        )
    }

    /// Classify a `reqwest` failure into a fetch error.
    pub fn from_reqwest(context: &str, err: &reqwest::Error) -> Self {
        let retryable = err.is_timeout()
            || err.is_connect()
            || err.is_request()
            || err
                .status()
                .is_some_and(|s| s.is_server_error() || s.as_u16() == 429);
        Self::Fetch {
            message: format!("{context}: {err}"),
            retryable,
        }
    }

    /// Classify a non-success HTTP status into a fetch error.
    pub fn from_status(context: &str, status: reqwest::StatusCode) -> Self {
        Self::Fetch {
            message: format!("{context}: server returned {status}"),
            retryable: status.is_server_error() || status.as_u16() == 429,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
