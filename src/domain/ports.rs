use crate::domain::config::WalletAddress;
use crate::domain::currency::{CurrencyId, Network};
use crate::domain::intent::{
    PaymentIntent, RequestId, TransactionRecord, TransactionRequest, TxHash, TxStatus,
};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub type WalletAdapterRef = Arc<dyn WalletAdapter>;
pub type PaymentRequestApiRef = Arc<dyn PaymentRequestApi>;
pub type RateSourceRef = Arc<dyn RateSource>;
pub type AttemptStoreRef = Arc<dyn AttemptStore>;

/// Capability surface of the connected wallet.
///
/// The engine never inspects wallet internals; everything it needs from the
/// wallet provider goes through this trait. All failures here are surfaced as
/// `PaymentError::Wallet` except status polling, which the executor
/// classifies itself.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Prompts the wallet to connect and returns the payer address.
    async fn connect(&self) -> Result<WalletAddress>;

    /// Ensures the wallet is on the given network, prompting a switch if
    /// needed. Fails if the user rejects or the wallet lacks the chain.
    async fn ensure_network(&self, network: Network) -> Result<()>;

    async fn disconnect(&self);

    async fn current_address(&self) -> Option<WalletAddress>;

    /// Signs and submits a transaction, returning its hash on mempool
    /// acceptance. Confirmation is the executor's job.
    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<TxHash>;

    /// Current on-chain status of a submitted transaction.
    async fn transaction_status(&self, hash: &TxHash) -> Result<TxStatus>;
}

/// Remote payment-request backend.
#[async_trait]
pub trait PaymentRequestApi: Send + Sync {
    /// Creates a payment request for the intent, or returns the existing one
    /// when a request with the same idempotency key was already created.
    async fn create_or_get_request(&self, intent: &PaymentIntent) -> Result<RequestId>;
}

/// External conversion-rate source.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// USD per one unit of the currency.
    async fn usd_rate(&self, currency: &CurrencyId) -> Result<Decimal>;
}

/// Persisted per-request transaction records.
///
/// The executor keys records by request id so that re-entering with the same
/// intent after a partial failure can detect an already-confirmed approval
/// and skip it.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Inserts the record, or replaces an existing record with the same hash.
    async fn record(&self, request_id: &RequestId, record: TransactionRecord) -> Result<()>;

    async fn records(&self, request_id: &RequestId) -> Result<Vec<TransactionRecord>>;
}
