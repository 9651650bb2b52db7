mod directory;

pub use directory::{spawn_reload_task, WalletDirectory, WalletError, WalletRecord};
