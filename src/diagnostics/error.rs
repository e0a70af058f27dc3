use thiserror::Error;

/// Failures at the diagnostics boundary; none of them escape past the requester.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("API key not found. Set the {var} environment variable.")]
    MissingCredential { var: String },

    #[error("diagnostics request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("text generation API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("text generation API returned no report text")]
    EmptyResponse,

    #[error("serializing metrics snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("an analysis is already in progress")]
    Busy,
}

impl DiagnosticsError {
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
