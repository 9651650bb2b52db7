use serde::{Deserialize, Serialize};

/// Mint identifier standing in for the chain's native asset (wrapped SOL);
/// the native asset has no mint of its own.
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// One enhanced-transaction record as delivered by the webhook provider.
/// Collections default to empty so partially-populated payloads still decode.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub signature: String,
    pub fee_payer: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub source: Option<String>,
    pub timestamp: Option<i64>,
    pub events: TransactionEvents,
    pub native_transfers: Vec<NativeTransfer>,
    pub token_transfers: Vec<TokenTransfer>,
    pub account_data: Vec<AccountData>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionEvents {
    pub swap: Option<SwapEvent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwapEvent {
    pub native_input: Option<NativeBalanceChange>,
    pub native_output: Option<NativeBalanceChange>,
    pub token_inputs: Vec<SwapTokenLeg>,
    pub token_outputs: Vec<SwapTokenLeg>,
    pub inner_swaps: Vec<InnerSwap>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeBalanceChange {
    pub account: String,
    /// Lamports.
    pub amount: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwapTokenLeg {
    pub mint: String,
    pub token_amount: f64,
    pub user_account: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InnerSwap {
    pub program_info: Option<ProgramInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramInfo {
    pub source: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeTransfer {
    /// Lamports.
    pub amount: u64,
    pub from_user_account: String,
    pub to_user_account: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenTransfer {
    pub mint: String,
    pub token_amount: f64,
    pub from_user_account: String,
    pub to_user_account: String,
    pub token_standard: Option<String>,
    pub decimals: Option<u8>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountData {
    pub account: String,
    pub native_balance_change: i64,
    pub token_balance_changes: Vec<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegDirection {
    In,
    Out,
}

/// One side of a swap, or the single transfer being reported.
#[derive(Clone, Debug, PartialEq)]
pub struct Leg {
    pub mint: String,
    pub amount: f64,
    pub direction: LegDirection,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransactionKind {
    Swap {
        venue: Option<String>,
        input: Leg,
        output: Leg,
    },
    NativeTransfer {
        from: String,
        to: String,
        amount: f64,
    },
    TokenTransfer {
        from: String,
        to: String,
        leg: Leg,
        /// Zero-decimal or NonFungible transfers skip market-data enrichment.
        fungible: bool,
    },
    Unsupported,
}

/// Normalized view of a raw record; never mutated after classification.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedTransaction {
    pub signature: String,
    pub fee_payer: String,
    pub kind: TransactionKind,
}

impl ClassifiedTransaction {
    /// Mint whose market snapshot the report embeds, if any.
    pub fn enrichment_mint(&self) -> Option<&str> {
        match &self.kind {
            TransactionKind::Swap { output, .. } => Some(output.mint.as_str()),
            TransactionKind::TokenTransfer {
                leg,
                fungible: true,
                ..
            } => Some(leg.mint.as_str()),
            _ => None,
        }
    }
}

/// Terminal outcome for one input transaction, returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub signature: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn ok(signature: String, message: String) -> Self {
        Self {
            signature,
            success: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn failed(signature: String, error: String) -> Self {
        Self {
            signature,
            success: false,
            message: None,
            error: Some(error),
        }
    }
}
