//! Simulated wallet, backend and rate source.
//!
//! These stand in for the real external collaborators in tests and in the
//! demo binary. They model observable behavior only (rejections, reverts,
//! confirmation latency, transient RPC errors), not chain semantics.

use crate::domain::config::WalletAddress;
use crate::domain::currency::{CurrencyId, Network};
use crate::domain::intent::{
    PaymentIntent, RequestId, TransactionRequest, TxHash, TxKind, TxStatus,
};
use crate::domain::ports::{PaymentRequestApi, RateSource, WalletAdapter};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tokio::sync::RwLock;

struct SimulatedTx {
    polls_left: u32,
    revert: bool,
}

/// Wallet double with scriptable failure behavior.
pub struct SimulatedWallet {
    address: WalletAddress,
    reject_connect: AtomicBool,
    reject_network: AtomicBool,
    reject_signature: AtomicBool,
    /// Payment transactions that will revert before one succeeds.
    revert_payments_remaining: AtomicU32,
    /// Transient status-poll errors thrown before polling works again.
    status_errors_remaining: AtomicU32,
    /// When set, transactions never confirm (for timeout tests).
    stall_confirmations: AtomicBool,
    confirmation_polls: u32,
    connected: RwLock<Option<WalletAddress>>,
    transactions: RwLock<HashMap<TxHash, SimulatedTx>>,
    submitted_approvals: AtomicU32,
    submitted_payments: AtomicU32,
    hash_counter: AtomicU64,
}

impl SimulatedWallet {
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            reject_connect: AtomicBool::new(false),
            reject_network: AtomicBool::new(false),
            reject_signature: AtomicBool::new(false),
            revert_payments_remaining: AtomicU32::new(0),
            status_errors_remaining: AtomicU32::new(0),
            stall_confirmations: AtomicBool::new(false),
            confirmation_polls: 1,
            connected: RwLock::new(None),
            transactions: RwLock::new(HashMap::new()),
            submitted_approvals: AtomicU32::new(0),
            submitted_payments: AtomicU32::new(0),
            hash_counter: AtomicU64::new(0),
        }
    }

    pub fn reject_connect(self) -> Self {
        self.reject_connect.store(true, Ordering::SeqCst);
        self
    }

    pub fn reject_network_switch(self) -> Self {
        self.reject_network.store(true, Ordering::SeqCst);
        self
    }

    pub fn reject_signature(self) -> Self {
        self.reject_signature.store(true, Ordering::SeqCst);
        self
    }

    /// The next `count` payment transactions revert on chain.
    pub fn revert_payments(self, count: u32) -> Self {
        self.revert_payments_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// The next `count` status polls fail with a transient RPC error.
    pub fn status_errors(self, count: u32) -> Self {
        self.status_errors_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Transactions stay pending forever.
    pub fn stall_confirmations(self) -> Self {
        self.stall_confirmations.store(true, Ordering::SeqCst);
        self
    }

    /// Number of polls a transaction stays pending before confirming.
    pub fn confirm_after_polls(mut self, polls: u32) -> Self {
        self.confirmation_polls = polls;
        self
    }

    /// Allows the scripted signature rejection to be lifted mid-test.
    pub fn accept_signatures(&self) {
        self.reject_signature.store(false, Ordering::SeqCst);
    }

    pub fn submitted(&self, kind: TxKind) -> u32 {
        match kind {
            TxKind::Approval => self.submitted_approvals.load(Ordering::SeqCst),
            TxKind::Payment => self.submitted_payments.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl WalletAdapter for SimulatedWallet {
    async fn connect(&self) -> Result<WalletAddress> {
        if self.reject_connect.load(Ordering::SeqCst) {
            return Err(PaymentError::Wallet(
                "user rejected the connection request".to_string(),
            ));
        }
        let mut connected = self.connected.write().await;
        *connected = Some(self.address.clone());
        Ok(self.address.clone())
    }

    async fn ensure_network(&self, network: Network) -> Result<()> {
        if self.reject_network.load(Ordering::SeqCst) {
            return Err(PaymentError::Wallet(format!(
                "user rejected switching to {network}"
            )));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        let mut connected = self.connected.write().await;
        *connected = None;
    }

    async fn current_address(&self) -> Option<WalletAddress> {
        self.connected.read().await.clone()
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<TxHash> {
        if self.reject_signature.load(Ordering::SeqCst) {
            return Err(PaymentError::Wallet(
                "user rejected the signature request".to_string(),
            ));
        }

        let revert = match request.kind {
            TxKind::Approval => {
                self.submitted_approvals.fetch_add(1, Ordering::SeqCst);
                false
            }
            TxKind::Payment => {
                self.submitted_payments.fetch_add(1, Ordering::SeqCst);
                self.revert_payments_remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            }
        };

        let n = self.hash_counter.fetch_add(1, Ordering::SeqCst);
        let hash = TxHash(format!("0x{n:064x}"));
        let mut transactions = self.transactions.write().await;
        transactions.insert(
            hash.clone(),
            SimulatedTx {
                polls_left: self.confirmation_polls,
                revert,
            },
        );
        Ok(hash)
    }

    async fn transaction_status(&self, hash: &TxHash) -> Result<TxStatus> {
        if self
            .status_errors_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PaymentError::Transaction(
                "simulated rpc timeout".to_string(),
            ));
        }
        if self.stall_confirmations.load(Ordering::SeqCst) {
            return Ok(TxStatus::Pending);
        }

        let mut transactions = self.transactions.write().await;
        let tx = transactions.get_mut(hash).ok_or_else(|| {
            PaymentError::Transaction(format!("unknown transaction {hash}"))
        })?;
        if tx.polls_left > 0 {
            tx.polls_left -= 1;
            return Ok(TxStatus::Pending);
        }
        Ok(if tx.revert {
            TxStatus::Failed
        } else {
            TxStatus::Confirmed
        })
    }
}

/// Payment-request backend double, idempotent on the intent's key.
#[derive(Default)]
pub struct SimulatedRequestApi {
    requests: RwLock<HashMap<String, RequestId>>,
    failures_remaining: AtomicU32,
    created: AtomicU32,
}

impl SimulatedRequestApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` calls fail before the backend recovers.
    pub fn fail_next(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of distinct requests actually created.
    pub fn request_count(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentRequestApi for SimulatedRequestApi {
    async fn create_or_get_request(&self, intent: &PaymentIntent) -> Result<RequestId> {
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PaymentError::Api(
                "request creation timed out".to_string(),
            ));
        }

        let key = intent.idempotency_key();
        let mut requests = self.requests.write().await;
        if let Some(existing) = requests.get(&key) {
            return Ok(existing.clone());
        }
        let id = RequestId(format!("req-{}", uuid::Uuid::new_v4()));
        requests.insert(key, id.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

/// Fixed conversion-rate table.
#[derive(Default, Clone)]
pub struct StaticRateSource {
    rates: HashMap<CurrencyId, Decimal>,
}

impl StaticRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: impl Into<CurrencyId>, rate: Decimal) -> Self {
        self.rates.insert(currency.into(), rate);
        self
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn usd_rate(&self, currency: &CurrencyId) -> Result<Decimal> {
        self.rates.get(currency).copied().ok_or_else(|| {
            PaymentError::Config(format!("no conversion rate for {currency}"))
        })
    }
}
