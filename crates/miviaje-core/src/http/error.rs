use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Cross-origin request blocked in same-origin mode: {0}")]
    CrossOrigin(String),

    #[error("Bad status {status} for {url}")]
    BadStatus { status: u16, url: String },
}

impl FetchError {
    /// True when no response was received at all.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Unreachable(_))
    }
}
