/// Point-in-time market facts for one token, as reported by the provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenSnapshot {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub price_usd: f64,
    pub change_1h_pct: f64,
    pub change_4h_pct: f64,
    pub change_24h_pct: f64,
    pub market_cap_usd: f64,
    pub liquidity_usd: f64,
    pub volume_1h_usd: f64,
    pub volume_4h_usd: f64,
    pub volume_24h_usd: f64,
    pub holders: u64,
    pub trades_24h: u64,
    pub buys_24h: u64,
    pub sells_24h: u64,
    pub last_trade_time: Option<String>,
}
