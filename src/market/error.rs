use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider reported an unsuccessful lookup")]
    Unsuccessful,

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl MarketDataError {
    /// Transient faults earn another attempt; a definitive miss does not.
    pub fn is_retryable(&self) -> bool {
        match self {
            MarketDataError::Transport(_) => true,
            MarketDataError::Status(code) => *code == 429 || *code >= 500,
            MarketDataError::Unsuccessful => false,
            MarketDataError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_statuses_are_retryable() {
        assert!(MarketDataError::Status(500).is_retryable());
        assert!(MarketDataError::Status(429).is_retryable());
        assert!(!MarketDataError::Status(404).is_retryable());
    }

    #[test]
    fn definitive_misses_are_not_retryable() {
        assert!(!MarketDataError::Unsuccessful.is_retryable());
        assert!(!MarketDataError::Decode("bad json".to_string()).is_retryable());
    }
}
