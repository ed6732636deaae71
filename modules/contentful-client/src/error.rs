use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentfulError>;

#[derive(Debug, Error)]
pub enum ContentfulError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Asset {0} did not finish processing")]
    ProcessingTimeout(String),

    #[error("Delivery API token not configured")]
    MissingDeliveryToken,
}

impl From<reqwest::Error> for ContentfulError {
    fn from(err: reqwest::Error) -> Self {
        ContentfulError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ContentfulError {
    fn from(err: serde_json::Error) -> Self {
        ContentfulError::Parse(err.to_string())
    }
}
