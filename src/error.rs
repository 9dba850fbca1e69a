//! Error taxonomy shared by the metadata client, the popularity store and startup.

/// Message shown to the user for any metadata failure. The detailed cause is only logged.
pub const USER_FETCH_ERROR: &str = "Failed fetching shows. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure, timeout, non-success status or unreadable body.
    #[error("metadata request failed: {0}")]
    Network(String),

    /// The provider answered but flagged the request as failed in its payload.
    #[error("metadata provider rejected the request: {0}")]
    ProviderRejected(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        USER_FETCH_ERROR
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("popularity store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
