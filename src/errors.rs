use thiserror::Error;

/// Top-level client error.
/// Every variant renders a human-readable message suitable for an alert banner.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Backend status errors ────────────────────────────────────────────────
    #[error("Not signed in or session expired ({endpoint})")]
    Unauthorized { endpoint: String },

    #[error("Access to {endpoint} is forbidden")]
    Forbidden { endpoint: String },

    #[error("Not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    // ── Local persistence errors ─────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── User-initiated writes ────────────────────────────────────────────────
    /// A send failed; `input` is handed back so the caller can restore it.
    #[error("Failed to send message: {source}")]
    SendFailed {
        input: String,
        #[source]
        source: Box<ClientError>,
    },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ClientError::Network { endpoint: endpoint.into(), source }
    }

    pub fn decode(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ClientError::Decode { endpoint: endpoint.into(), source }
    }

    pub fn empty_field(field_name: impl Into<String>) -> Self {
        ClientError::EmptyField { field_name: field_name.into() }
    }

    pub fn send_failed(input: impl Into<String>, source: ClientError) -> Self {
        ClientError::SendFailed { input: input.into(), source: Box::new(source) }
    }

    /// The text the user typed, if this error came from a failed send.
    pub fn unsent_input(&self) -> Option<&str> {
        match self {
            ClientError::SendFailed { input, .. } => Some(input),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthorized { .. } => true,
            ClientError::SendFailed { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::Unauthorized { .. } | ClientError::Forbidden { .. } => true,
            ClientError::SendFailed { source, .. } => source.is_auth_failure(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::EmptyField { .. } | ClientError::FieldTooLong { .. })
    }

    /// Failures worth retrying by hand: transport trouble and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network { .. } => true,
            ClientError::Server { status, .. } => *status >= 500,
            ClientError::SendFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}
