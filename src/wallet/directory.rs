use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::{Duration, SystemTime};

use log::{error, info, warn};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet file not found at {0}")]
    FileMissing(PathBuf),

    #[error("failed to read wallet file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WalletRecord {
    pub address: String,
    pub label: String,
}

/// Reloadable address -> label table; lookups are case-insensitive.
pub struct WalletDirectory {
    wallets: RwLock<HashMap<String, WalletRecord>>,
    path: Option<PathBuf>,
}

impl WalletDirectory {
    /// Load the directory from a CSV file with an `address,label` header.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(WalletError::FileMissing(path));
        }

        let wallets = read_wallet_file(&path)?;
        info!("loaded {} wallets from {}", wallets.len(), path.display());

        Ok(Self {
            wallets: RwLock::new(wallets),
            path: Some(path),
        })
    }

    /// Build a directory from in-memory records; used by tests and tools.
    pub fn from_records(records: impl IntoIterator<Item = WalletRecord>) -> Self {
        let mut wallets = HashMap::new();
        for record in records {
            wallets.entry(record.address.to_lowercase()).or_insert(record);
        }

        Self {
            wallets: RwLock::new(wallets),
            path: None,
        }
    }

    pub fn is_tracked(&self, address: &str) -> bool {
        self.read().contains_key(&address.to_lowercase())
    }

    pub fn label_of(&self, address: &str) -> Option<String> {
        self.read()
            .get(&address.to_lowercase())
            .map(|record| record.label.clone())
    }

    /// Addresses as they appear in the file, not the folded lookup keys.
    pub fn addresses(&self) -> Vec<String> {
        self.read()
            .values()
            .map(|record| record.address.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Re-read the backing file, swapping the table in one step. The old
    /// table stays in place if the reload fails.
    pub fn reload(&self) -> Result<usize, WalletError> {
        let Some(path) = &self.path else {
            return Ok(self.len());
        };

        let wallets = read_wallet_file(path)?;
        let count = wallets.len();
        *self
            .wallets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = wallets;

        Ok(count)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, WalletRecord>> {
        self.wallets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_wallet_file(path: &Path) -> Result<HashMap<String, WalletRecord>, WalletError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut wallets = HashMap::new();
    for row in reader.deserialize::<WalletRecord>() {
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping invalid wallet row: {err}");
                continue;
            }
        };

        if record.address.is_empty() || record.label.is_empty() {
            warn!("skipping wallet row with an empty address or label");
            continue;
        }

        let key = record.address.to_lowercase();
        if wallets.contains_key(&key) {
            warn!(
                "duplicate wallet address {}, keeping the first entry",
                record.address
            );
            continue;
        }
        wallets.insert(key, record);
    }

    Ok(wallets)
}

/// Poll the wallet file and reload the directory when it is rewritten.
/// Reload failures keep the previous table and are logged.
pub fn spawn_reload_task(
    directory: Arc<WalletDirectory>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Some(path) = directory.path.clone() else {
            return;
        };

        let mut last_modified = file_mtime(&path).await;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let modified = file_mtime(&path).await;
            if modified != last_modified {
                last_modified = modified;
                match directory.reload() {
                    Ok(count) => info!("wallet file changed, reloaded {count} wallets"),
                    Err(err) => error!("wallet file reload failed: {err}"),
                }
            }
        }
    })
}

async fn file_mtime(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|meta| meta.modified().ok())
}
