use crate::domain::config::{FeeInfo, WalletAddress};
use crate::domain::currency::CurrencyId;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a payment request issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of a submitted on-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a transaction within one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// ERC-20 allowance granted before the payment itself.
    Approval,
    Payment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One on-chain transaction submitted for a payment attempt.
///
/// Records are persisted per request id so a resumed attempt can see which
/// sub-transactions already confirmed and skip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub kind: TxKind,
    pub status: TxStatus,
}

/// What the wallet adapter is asked to sign and submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub kind: TxKind,
    pub currency: CurrencyId,
    /// Token contract for ERC-20 settlements, `None` for native transfers.
    pub token_address: Option<String>,
    pub to: WalletAddress,
    pub amount: Decimal,
}

/// Frozen input for one execution attempt.
///
/// Built fresh on every confirmation from the currently selected currency and
/// quote; never reused across retries, so a stale amount can never be
/// resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub payer_wallet: WalletAddress,
    pub amount_usd: Decimal,
    pub recipient_wallet: WalletAddress,
    pub payment_currency: CurrencyId,
    /// Total in the settlement currency, fee included. Threaded from the
    /// quote the payer confirmed, never recomputed here.
    pub payable_amount: Decimal,
    pub fee_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_info: Option<FeeInfo>,
}

impl PaymentIntent {
    /// Stable key the backend deduplicates on when no explicit reference was
    /// supplied by the host.
    pub fn idempotency_key(&self) -> String {
        match &self.reference {
            Some(reference) => reference.clone(),
            None => format!(
                "{}:{}:{}:{}",
                self.payer_wallet, self.recipient_wallet, self.payment_currency, self.amount_usd
            ),
        }
    }
}

/// Terminal result of one execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Success {
        request_id: RequestId,
        transaction_receipts: Vec<TransactionRecord>,
    },
    Failure {
        error: PaymentError,
    },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Success { .. })
    }
}
