use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::error::MarketDataError;
use super::types::TokenSnapshot;
use super::MarketDataSource;

const DEFAULT_BASE_URL: &str = "https://public-api.birdeye.so";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Token-overview client for the Birdeye public API.
pub struct BirdeyeClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl BirdeyeClient {
    pub fn new(api_key: String) -> Result<Self, MarketDataError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, MarketDataError> {
        // The per-request timeout doubles as the per-attempt bound for the
        // cache's retry loop.
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }
}

#[async_trait]
impl MarketDataSource for BirdeyeClient {
    async fn fetch_overview(&self, mint: &str) -> Result<TokenSnapshot, MarketDataError> {
        let url = format!("{}/defi/token_overview", self.base_url);
        debug!("fetching token overview for {mint}");

        let response = self
            .http_client
            .get(&url)
            .query(&[("address", mint)])
            .header("accept", "application/json")
            .header("x-chain", "solana")
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status(status.as_u16()));
        }

        let body = response.json::<OverviewResponse>().await?;
        if !body.success {
            return Err(MarketDataError::Unsuccessful);
        }

        let data = body
            .data
            .ok_or_else(|| MarketDataError::Decode("missing data object".to_string()))?;

        Ok(data.into_snapshot(mint))
    }
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(default)]
    success: bool,
    data: Option<OverviewData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OverviewData {
    address: String,
    symbol: String,
    name: String,
    price: f64,
    price_change1h_percent: f64,
    price_change4h_percent: f64,
    price_change24h_percent: f64,
    mc: f64,
    liquidity: f64,
    #[serde(rename = "v1hUSD")]
    v1h_usd: f64,
    #[serde(rename = "v4hUSD")]
    v4h_usd: f64,
    #[serde(rename = "v24hUSD")]
    v24h_usd: f64,
    holder: u64,
    trade24h: u64,
    buy24h: u64,
    sell24h: u64,
    last_trade_human_time: Option<String>,
}

impl OverviewData {
    fn into_snapshot(self, requested_mint: &str) -> TokenSnapshot {
        let mint = if self.address.is_empty() {
            requested_mint.to_string()
        } else {
            self.address
        };

        TokenSnapshot {
            mint,
            symbol: self.symbol,
            name: self.name,
            price_usd: self.price,
            change_1h_pct: self.price_change1h_percent,
            change_4h_pct: self.price_change4h_percent,
            change_24h_pct: self.price_change24h_percent,
            market_cap_usd: self.mc,
            liquidity_usd: self.liquidity,
            volume_1h_usd: self.v1h_usd,
            volume_4h_usd: self.v4h_usd,
            volume_24h_usd: self.v24h_usd,
            holders: self.holder,
            trades_24h: self.trade24h,
            buys_24h: self.buy24h,
            sells_24h: self.sell24h,
            last_trade_time: self.last_trade_human_time,
        }
    }
}
