pub mod cache;
pub mod client;
pub mod error;
pub mod retry;
pub mod types;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use error::MarketDataError;
use types::TokenSnapshot;

/// Outbound seam to the market-data provider; mocked in tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_overview(&self, mint: &str) -> Result<TokenSnapshot, MarketDataError>;
}

pub use cache::MarketDataCache;
pub use client::BirdeyeClient;
