use thiserror::Error;

use super::types::{
    ClassifiedTransaction, Leg, LegDirection, RawTransaction, SwapEvent, TransactionKind,
    LAMPORTS_PER_SOL, NATIVE_MINT,
};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ClassifyError {
    #[error("swap {signature} has no resolvable input/output legs")]
    MissingSwapLegs { signature: String },

    #[error("transfer {signature} carries no native or token transfers")]
    EmptyTransfer { signature: String },
}

/// Sort a raw webhook record into the closed set of reportable kinds.
///
/// Multi-entry transfer and swap-leg arrays are reduced to their first
/// element so each report stays single-subject.
pub fn classify(raw: &RawTransaction) -> Result<ClassifiedTransaction, ClassifyError> {
    let kind = match raw.transaction_type.as_str() {
        "SWAP" => classify_swap(raw)?,
        "TRANSFER" => classify_transfer(raw)?,
        _ => TransactionKind::Unsupported,
    };

    Ok(ClassifiedTransaction {
        signature: raw.signature.clone(),
        fee_payer: raw.fee_payer.clone(),
        kind,
    })
}

fn classify_swap(raw: &RawTransaction) -> Result<TransactionKind, ClassifyError> {
    let missing = || ClassifyError::MissingSwapLegs {
        signature: raw.signature.clone(),
    };

    let swap = raw.events.swap.as_ref().ok_or_else(missing)?;

    let input = if let Some(native) = &swap.native_input {
        Some(Leg {
            mint: NATIVE_MINT.to_string(),
            amount: native.amount as f64 / LAMPORTS_PER_SOL,
            direction: LegDirection::In,
        })
    } else {
        swap.token_inputs.first().map(|leg| Leg {
            mint: leg.mint.clone(),
            amount: leg.token_amount,
            direction: LegDirection::In,
        })
    };

    let output = swap.token_outputs.first().map(|leg| Leg {
        mint: leg.mint.clone(),
        amount: leg.token_amount,
        direction: LegDirection::Out,
    });

    match (input, output) {
        (Some(input), Some(output)) => Ok(TransactionKind::Swap {
            venue: swap_venue(raw, swap),
            input,
            output,
        }),
        _ => Err(missing()),
    }
}

fn swap_venue(raw: &RawTransaction, swap: &SwapEvent) -> Option<String> {
    swap.inner_swaps
        .first()
        .and_then(|inner| inner.program_info.as_ref())
        .map(|info| info.source.clone())
        .or_else(|| raw.source.clone())
}

fn classify_transfer(raw: &RawTransaction) -> Result<TransactionKind, ClassifyError> {
    if let Some(transfer) = raw.native_transfers.first() {
        return Ok(TransactionKind::NativeTransfer {
            from: transfer.from_user_account.clone(),
            to: transfer.to_user_account.clone(),
            amount: transfer.amount as f64 / LAMPORTS_PER_SOL,
        });
    }

    if let Some(transfer) = raw.token_transfers.first() {
        let fungible = transfer.decimals != Some(0)
            && !matches!(transfer.token_standard.as_deref(), Some("NonFungible"));
        return Ok(TransactionKind::TokenTransfer {
            from: transfer.from_user_account.clone(),
            to: transfer.to_user_account.clone(),
            leg: Leg {
                mint: transfer.mint.clone(),
                amount: transfer.token_amount,
                direction: LegDirection::Out,
            },
            fungible,
        });
    }

    Err(ClassifyError::EmptyTransfer {
        signature: raw.signature.clone(),
    })
}
