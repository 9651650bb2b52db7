use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::market::MarketDataCache;
use crate::wallet::WalletDirectory;

use super::classifier;
use super::formatter;
use super::types::{ProcessingResult, RawTransaction, TransactionKind};

/// Orchestrates one webhook batch: wallet filter -> classify -> market-data
/// lookup -> report, with every failure isolated to its own transaction.
pub struct EnrichmentPipeline {
    wallets: Arc<WalletDirectory>,
    cache: Arc<MarketDataCache>,
}

impl EnrichmentPipeline {
    pub fn new(wallets: Arc<WalletDirectory>, cache: Arc<MarketDataCache>) -> Self {
        Self { wallets, cache }
    }

    /// One result per tracked, supported transaction; untracked and
    /// unsupported records are dropped without a result.
    pub async fn process(&self, batch: Vec<RawTransaction>) -> Vec<ProcessingResult> {
        let mut results = Vec::new();
        let mut classified = Vec::new();

        for raw in &batch {
            if !self.wallets.is_tracked(&raw.fee_payer) {
                continue;
            }

            match classifier::classify(raw) {
                Ok(tx) if matches!(tx.kind, TransactionKind::Unsupported) => {
                    debug!("skipping unsupported transaction {}", tx.signature);
                }
                Ok(tx) => classified.push(tx),
                Err(err) => {
                    warn!("classification failed for {}: {err}", raw.signature);
                    results.push(ProcessingResult::failed(
                        raw.signature.clone(),
                        err.to_string(),
                    ));
                }
            }
        }

        // One provider round per batch: every report's mint resolved together.
        let mints: HashSet<String> = classified
            .iter()
            .filter_map(|tx| tx.enrichment_mint().map(str::to_string))
            .collect();
        let snapshots = self.cache.get_many(&mints).await;

        for tx in &classified {
            let rendered = std::panic::catch_unwind(AssertUnwindSafe(|| {
                formatter::format_report(tx, &snapshots, &self.wallets)
            }));

            match rendered {
                Ok(message) => {
                    info!("{message}");
                    results.push(ProcessingResult::ok(tx.signature.clone(), message));
                }
                Err(_) => {
                    // A report that cannot render must not take its siblings
                    // down with it.
                    error!("report rendering panicked for {}", tx.signature);
                    results.push(ProcessingResult::failed(
                        tx.signature.clone(),
                        "internal error while rendering report".to_string(),
                    ));
                }
            }
        }

        results
    }
}
