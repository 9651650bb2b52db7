use std::env;

use thiserror::Error;

const DEFAULT_PORT: u16 = 5420;
const DEFAULT_WALLETS_PATH: &str = "./wallets.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Process configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub birdeye_api_key: String,
    /// Webhook registration is skipped when either of these is unset.
    pub helius_api_key: Option<String>,
    pub webhook_url: Option<String>,
    pub wallets_csv_path: String,
}

impl AppConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_port()?,
            birdeye_api_key: required("BIRDEYE_API_KEY")?,
            helius_api_key: optional("HELIUS_API_KEY"),
            webhook_url: optional("WEBHOOK_URL"),
            wallets_csv_path: optional("WALLETS_CSV_PATH")
                .unwrap_or_else(|| DEFAULT_WALLETS_PATH.to_string()),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_port() -> Result<u16, ConfigError> {
    match optional("PORT") {
        None => Ok(DEFAULT_PORT),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name: "PORT", value }),
    }
}
