pub mod config;
pub mod market;
pub mod pipeline;
pub mod server;
pub mod wallet;
pub mod webhook;

// Re-export key types
pub use config::AppConfig;

pub use market::{BirdeyeClient, MarketDataCache, MarketDataSource};

pub use pipeline::{
    types::{ClassifiedTransaction, ProcessingResult, RawTransaction},
    ClassifyError, EnrichmentPipeline,
};

pub use wallet::{WalletDirectory, WalletRecord};
