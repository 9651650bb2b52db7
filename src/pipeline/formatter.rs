use std::collections::HashMap;

use crate::market::types::TokenSnapshot;
use crate::wallet::WalletDirectory;

use super::types::{ClassifiedTransaction, Leg, TransactionKind, NATIVE_MINT};

const EXPLORER_TX_BASE: &str = "https://solscan.io/tx";
const UNKNOWN_LABEL: &str = "Unknown";

/// Render a classified transaction into a multi-line report.
///
/// Pure over its inputs: the same transaction, snapshot map, and directory
/// contents always produce the same text. Missing snapshots degrade the
/// report instead of failing it.
pub fn format_report(
    tx: &ClassifiedTransaction,
    snapshots: &HashMap<String, TokenSnapshot>,
    wallets: &WalletDirectory,
) -> String {
    match &tx.kind {
        TransactionKind::Swap {
            venue,
            input,
            output,
        } => format_swap(tx, venue.as_deref(), input, output, snapshots, wallets),
        TransactionKind::NativeTransfer { from, to, amount } => {
            format_native_transfer(tx, from, to, *amount, wallets)
        }
        TransactionKind::TokenTransfer { from, to, leg, .. } => {
            format_token_transfer(tx, from, to, leg, snapshots, wallets)
        }
        // Unsupported kinds are dropped by the pipeline before formatting.
        TransactionKind::Unsupported => String::new(),
    }
}

fn format_swap(
    tx: &ClassifiedTransaction,
    venue: Option<&str>,
    input: &Leg,
    output: &Leg,
    snapshots: &HashMap<String, TokenSnapshot>,
    wallets: &WalletDirectory,
) -> String {
    let output_snapshot = snapshots.get(&output.mint);

    let mut report = format!(
        "🔄 SWAP on {}\n{}\n🔹 Swapped {} {} for {} {}",
        venue.unwrap_or(UNKNOWN_LABEL),
        display_wallet(&tx.fee_payer, wallets),
        input.amount,
        asset_symbol(&input.mint, snapshots),
        output.amount,
        asset_symbol(&output.mint, snapshots),
    );

    if let Some(snapshot) = output_snapshot {
        let value_usd = output.amount * snapshot.price_usd;
        report.push_str(&format!(
            "\n💰 Value: ${:.2} (@${})",
            value_usd,
            format_price(snapshot.price_usd)
        ));
        report.push_str(&market_block(snapshot));
    }

    report.push_str(&explorer_line(&tx.signature));
    report
}

fn format_native_transfer(
    tx: &ClassifiedTransaction,
    from: &str,
    to: &str,
    amount: f64,
    wallets: &WalletDirectory,
) -> String {
    format!(
        "💸 SOL Transfer: {:.4} SOL\nFrom: {}\nTo: {}{}",
        amount,
        display_wallet(from, wallets),
        display_wallet(to, wallets),
        explorer_line(&tx.signature),
    )
}

fn format_token_transfer(
    tx: &ClassifiedTransaction,
    from: &str,
    to: &str,
    leg: &Leg,
    snapshots: &HashMap<String, TokenSnapshot>,
    wallets: &WalletDirectory,
) -> String {
    let snapshot = snapshots.get(&leg.mint);

    let mut report = format!(
        "💸 Token Transfer: {} {}\nFrom: {}\nTo: {}",
        leg.amount,
        asset_symbol(&leg.mint, snapshots),
        display_wallet(from, wallets),
        display_wallet(to, wallets),
    );

    if let Some(snapshot) = snapshot {
        report.push_str(&format!(
            "\n\n📊 Price: ${}",
            format_price(snapshot.price_usd)
        ));
        report.push_str(&market_block(snapshot));
    }

    report.push_str(&explorer_line(&tx.signature));
    report
}

fn market_block(snapshot: &TokenSnapshot) -> String {
    let mut block = format!(
        "\n\n📊 Price Action:\n1h: {}{:.2}%\n4h: {}{:.2}%\n24h: {}{:.2}%",
        change_marker(snapshot.change_1h_pct),
        snapshot.change_1h_pct,
        change_marker(snapshot.change_4h_pct),
        snapshot.change_4h_pct,
        change_marker(snapshot.change_24h_pct),
        snapshot.change_24h_pct,
    );

    block.push_str(&format!(
        "\n\n💎 Token Metrics:\nMC: ${}\nLiquidity: ${}\nHolders: {}",
        format_compact(snapshot.market_cap_usd),
        format_compact(snapshot.liquidity_usd),
        snapshot.holders,
    ));

    block.push_str(&format!(
        "\n\n📈 Volume (USD):\n1h: ${}\n4h: ${}\n24h: ${}",
        format_compact(snapshot.volume_1h_usd),
        format_compact(snapshot.volume_4h_usd),
        format_compact(snapshot.volume_24h_usd),
    ));

    block.push_str(&format!(
        "\n\n🔄 24h Trading Activity:\nTrades: {}",
        snapshot.trades_24h
    ));
    if snapshot.trades_24h > 0 {
        let buy_pct = snapshot.buys_24h as f64 / snapshot.trades_24h as f64 * 100.0;
        let sell_pct = snapshot.sells_24h as f64 / snapshot.trades_24h as f64 * 100.0;
        block.push_str(&format!(
            "\nBuy: {:.1}% ({})\nSell: {:.1}% ({})",
            buy_pct, snapshot.buys_24h, sell_pct, snapshot.sells_24h
        ));
    }

    if let Some(last_trade) = &snapshot.last_trade_time {
        block.push_str(&format!("\nLast Trade: {last_trade}"));
    }

    block
}

fn explorer_line(signature: &str) -> String {
    format!("\n🔗 {EXPLORER_TX_BASE}/{signature}")
}

fn asset_symbol(mint: &str, snapshots: &HashMap<String, TokenSnapshot>) -> String {
    if mint == NATIVE_MINT {
        return "SOL".to_string();
    }
    snapshots
        .get(mint)
        .map(|snapshot| snapshot.symbol.clone())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

fn display_wallet(address: &str, wallets: &WalletDirectory) -> String {
    let label = wallets
        .label_of(address)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    format!("{} ({})", label, short_address(address))
}

fn short_address(address: &str) -> String {
    if address.len() <= 8 {
        address.to_string()
    } else {
        format!("{}...{}", &address[..4], &address[address.len() - 4..])
    }
}

fn change_marker(pct: f64) -> &'static str {
    if pct > 0.0 {
        "🟢"
    } else if pct < 0.0 {
        "🔴"
    } else {
        "⚪"
    }
}

/// Compact dollar figure: 1.23B / 4.56M / 7.8K, plain below a thousand.
fn format_compact(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

/// Sub-cent tokens need more places to keep their leading digits.
fn format_price(price: f64) -> String {
    let magnitude = price.abs();
    if magnitude >= 1_000.0 {
        format!("{price:.2}")
    } else if magnitude >= 1.0 {
        format!("{price:.4}")
    } else if magnitude >= 0.01 {
        format!("{price:.6}")
    } else {
        format!("{price:.8}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::LegDirection;
    use crate::wallet::WalletRecord;

    fn wallets() -> WalletDirectory {
        WalletDirectory::from_records(vec![
            WalletRecord {
                address: "Payer111111111111111111111111111111111111111".to_string(),
                label: "whale-one".to_string(),
            },
            WalletRecord {
                address: "Dest2222222222222222222222222222222222222222".to_string(),
                label: "fund-two".to_string(),
            },
        ])
    }

    fn swap_tx() -> ClassifiedTransaction {
        ClassifiedTransaction {
            signature: "SIGSWAP".to_string(),
            fee_payer: "Payer111111111111111111111111111111111111111".to_string(),
            kind: TransactionKind::Swap {
                venue: Some("JUPITER".to_string()),
                input: Leg {
                    mint: NATIVE_MINT.to_string(),
                    amount: 1.5,
                    direction: LegDirection::In,
                },
                output: Leg {
                    mint: "Mint1111".to_string(),
                    amount: 42.0,
                    direction: LegDirection::Out,
                },
            },
        }
    }

    fn snapshot() -> TokenSnapshot {
        TokenSnapshot {
            mint: "Mint1111".to_string(),
            symbol: "TOK".to_string(),
            name: "Token".to_string(),
            price_usd: 0.5,
            change_1h_pct: 2.0,
            change_4h_pct: -1.0,
            change_24h_pct: 0.0,
            market_cap_usd: 12_500_000.0,
            liquidity_usd: 480_000.0,
            volume_1h_usd: 9_000.0,
            volume_4h_usd: 31_000.0,
            volume_24h_usd: 1_200_000.0,
            holders: 5_321,
            trades_24h: 900,
            buys_24h: 600,
            sells_24h: 300,
            last_trade_time: Some("2024-05-01T10:00:00".to_string()),
        }
    }

    #[test]
    fn swap_report_embeds_market_data() {
        let mut snapshots = HashMap::new();
        snapshots.insert("Mint1111".to_string(), snapshot());

        let report = format_report(&swap_tx(), &snapshots, &wallets());

        assert!(report.contains("🔄 SWAP on JUPITER"));
        assert!(report.contains("whale-one (Paye...1111)"));
        assert!(report.contains("Swapped 1.5 SOL for 42 TOK"));
        assert!(report.contains("Value: $21.00 (@$0.500000)"));
        assert!(report.contains("1h: 🟢2.00%"));
        assert!(report.contains("4h: 🔴-1.00%"));
        assert!(report.contains("24h: ⚪0.00%"));
        assert!(report.contains("MC: $12.50M"));
        assert!(report.contains("Liquidity: $480.0K"));
        assert!(report.contains("Holders: 5321"));
        assert!(report.contains("24h: $1.20M"));
        assert!(report.contains("Buy: 66.7% (600)"));
        assert!(report.contains("Sell: 33.3% (300)"));
        assert!(report.contains("Last Trade: 2024-05-01T10:00:00"));
        assert!(report.contains("https://solscan.io/tx/SIGSWAP"));
    }

    #[test]
    fn swap_report_degrades_without_a_snapshot() {
        let report = format_report(&swap_tx(), &HashMap::new(), &wallets());

        assert!(report.contains("Swapped 1.5 SOL for 42 Unknown"));
        assert!(!report.contains("Price Action"));
        assert!(!report.contains("Value:"));
        assert!(report.contains("https://solscan.io/tx/SIGSWAP"));
    }

    #[test]
    fn format_is_idempotent() {
        let mut snapshots = HashMap::new();
        snapshots.insert("Mint1111".to_string(), snapshot());
        let directory = wallets();
        let tx = swap_tx();

        assert_eq!(
            format_report(&tx, &snapshots, &directory),
            format_report(&tx, &snapshots, &directory)
        );
    }

    #[test]
    fn native_transfer_report_resolves_both_parties() {
        let tx = ClassifiedTransaction {
            signature: "SIG1".to_string(),
            fee_payer: "Payer111111111111111111111111111111111111111".to_string(),
            kind: TransactionKind::NativeTransfer {
                from: "Payer111111111111111111111111111111111111111".to_string(),
                to: "Dest2222222222222222222222222222222222222222".to_string(),
                amount: 2.5,
            },
        };

        let report = format_report(&tx, &HashMap::new(), &wallets());

        assert!(report.contains("SOL Transfer: 2.5000 SOL"));
        assert!(report.contains("From: whale-one (Paye...1111)"));
        assert!(report.contains("To: fund-two (Dest...2222)"));
        assert!(report.contains("https://solscan.io/tx/SIG1"));
    }

    #[test]
    fn unknown_addresses_get_a_placeholder_label() {
        let tx = ClassifiedTransaction {
            signature: "SIG2".to_string(),
            fee_payer: "Stranger9999999999999999999999999999999999999".to_string(),
            kind: TransactionKind::NativeTransfer {
                from: "Stranger9999999999999999999999999999999999999".to_string(),
                to: "Dest2222222222222222222222222222222222222222".to_string(),
                amount: 1.0,
            },
        };

        let report = format_report(&tx, &HashMap::new(), &wallets());
        assert!(report.contains("From: Unknown (Stra...9999)"));
    }

    #[test]
    fn token_transfer_with_snapshot_embeds_price() {
        let mut snapshots = HashMap::new();
        snapshots.insert("Mint1111".to_string(), snapshot());

        let tx = ClassifiedTransaction {
            signature: "SIG3".to_string(),
            fee_payer: "Payer111111111111111111111111111111111111111".to_string(),
            kind: TransactionKind::TokenTransfer {
                from: "Payer111111111111111111111111111111111111111".to_string(),
                to: "Dest2222222222222222222222222222222222222222".to_string(),
                leg: Leg {
                    mint: "Mint1111".to_string(),
                    amount: 250.0,
                    direction: LegDirection::Out,
                },
                fungible: true,
            },
        };

        let report = format_report(&tx, &snapshots, &wallets());

        assert!(report.contains("Token Transfer: 250 TOK"));
        assert!(report.contains("📊 Price: $0.500000"));
        assert!(report.contains("Price Action"));
    }

    #[test]
    fn compact_formatting_uses_magnitude_suffixes() {
        assert_eq!(format_compact(2_500_000_000.0), "2.50B");
        assert_eq!(format_compact(12_500_000.0), "12.50M");
        assert_eq!(format_compact(9_800.0), "9.8K");
        assert_eq!(format_compact(950.0), "950.00");
    }

    #[test]
    fn price_precision_grows_as_magnitude_shrinks() {
        assert_eq!(format_price(1234.5), "1234.50");
        assert_eq!(format_price(3.25), "3.2500");
        assert_eq!(format_price(0.042), "0.042000");
        assert_eq!(format_price(0.00001234), "0.00001234");
    }

    #[test]
    fn short_addresses_are_not_truncated() {
        assert_eq!(short_address("abcd"), "abcd");
        assert_eq!(
            short_address("abcdefghijklmnop"),
            "abcd...mnop"
        );
    }

    #[test]
    fn zero_trades_omit_the_buy_sell_split() {
        let quiet = TokenSnapshot {
            trades_24h: 0,
            buys_24h: 0,
            sells_24h: 0,
            ..snapshot()
        };
        let block = market_block(&quiet);

        assert!(block.contains("Trades: 0"));
        assert!(!block.contains("Buy:"));
    }
}
