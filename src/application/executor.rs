use crate::domain::currency::{AssetKind, Currency};
use crate::domain::intent::{
    PaymentIntent, PaymentOutcome, RequestId, TransactionRecord, TransactionRequest, TxHash,
    TxKind, TxStatus,
};
use crate::domain::ports::{AttemptStoreRef, PaymentRequestApiRef, WalletAdapterRef};
use crate::error::{PaymentError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Tunables for transaction confirmation.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on waiting for one transaction to confirm. On expiry the
    /// attempt fails as a transaction error with the record left pending.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    /// Consecutive status-poll errors tolerated before escalating.
    pub max_status_retries: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
            max_status_retries: 3,
        }
    }
}

/// Turns one frozen [`PaymentIntent`] into on-chain transactions and a
/// settled payment request, or a classified failure.
///
/// The executor never reports an outcome on submission alone: every
/// transaction is polled to confirmation (or failure, or timeout) first. It
/// performs no automatic resubmission; retries re-enter through the state
/// machine with a fresh intent, and already-confirmed transactions are
/// detected from the attempt store and skipped: a confirmed approval is not
/// re-approved, and a request whose payment already confirmed settles
/// without submitting anything.
pub struct PaymentExecutor {
    wallet: WalletAdapterRef,
    api: PaymentRequestApiRef,
    attempts: AttemptStoreRef,
    config: ExecutorConfig,
}

impl PaymentExecutor {
    pub fn new(
        wallet: WalletAdapterRef,
        api: PaymentRequestApiRef,
        attempts: AttemptStoreRef,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            wallet,
            api,
            attempts,
            config,
        }
    }

    /// Executes the intent. Errors never escape as `Err`; they are classified
    /// and folded into the outcome so the state machine receives data, not
    /// exceptions.
    pub async fn execute(&self, intent: &PaymentIntent) -> PaymentOutcome {
        match self.run(intent).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(kind = ?error.kind(), %error, "payment attempt failed");
                PaymentOutcome::Failure { error }
            }
        }
    }

    async fn run(&self, intent: &PaymentIntent) -> Result<PaymentOutcome> {
        let currency = Currency::lookup(&intent.payment_currency).ok_or_else(|| {
            PaymentError::Validation(format!(
                "intent references unknown currency {}",
                intent.payment_currency
            ))
        })?;

        let request_id = self
            .api
            .create_or_get_request(intent)
            .await
            .map_err(|e| match e {
                PaymentError::Api(_) => e,
                other => PaymentError::Api(other.to_string()),
            })?;
        tracing::info!(%request_id, currency = %currency.id, "payment request ready");

        let prior = self.attempts.records(&request_id).await?;
        let mut receipts: Vec<TransactionRecord> = prior
            .iter()
            .filter(|r| r.status == TxStatus::Confirmed)
            .cloned()
            .collect();

        // An abandoned attempt may have confirmed on chain after the host
        // moved on. The request is already settled; submitting again would
        // charge the payer twice.
        if receipts.iter().any(|r| r.kind == TxKind::Payment) {
            tracing::info!(%request_id, "payment already confirmed, nothing to submit");
            return Ok(PaymentOutcome::Success {
                request_id,
                transaction_receipts: receipts,
            });
        }

        if let AssetKind::Erc20 { token_address } = &currency.kind {
            let approval_confirmed = receipts.iter().any(|r| r.kind == TxKind::Approval);
            if approval_confirmed {
                tracing::info!(%request_id, "approval already confirmed, skipping");
            } else {
                let approval = TransactionRequest {
                    kind: TxKind::Approval,
                    currency: currency.id.clone(),
                    token_address: Some(token_address.clone()),
                    to: intent.recipient_wallet.clone(),
                    amount: intent.payable_amount,
                };
                let record = self.submit_and_confirm(&request_id, &approval).await?;
                receipts.push(record);
            }
        }

        let payment = TransactionRequest {
            kind: TxKind::Payment,
            currency: currency.id.clone(),
            token_address: match &currency.kind {
                AssetKind::Erc20 { token_address } => Some(token_address.clone()),
                AssetKind::Native => None,
            },
            to: intent.recipient_wallet.clone(),
            amount: intent.payable_amount,
        };
        let record = self.submit_and_confirm(&request_id, &payment).await?;
        receipts.push(record);

        tracing::info!(%request_id, transactions = receipts.len(), "payment settled");
        Ok(PaymentOutcome::Success {
            request_id,
            transaction_receipts: receipts,
        })
    }

    /// Submits one transaction and waits for on-chain confirmation, keeping
    /// the attempt store in sync with the observed status.
    async fn submit_and_confirm(
        &self,
        request_id: &RequestId,
        request: &TransactionRequest,
    ) -> Result<TransactionRecord> {
        let hash = self
            .wallet
            .submit_transaction(request)
            .await
            .map_err(|e| match e {
                PaymentError::Wallet(_) => e,
                other => PaymentError::Wallet(other.to_string()),
            })?;
        tracing::info!(%request_id, %hash, kind = ?request.kind, "transaction submitted");

        let mut record = TransactionRecord {
            hash: hash.clone(),
            kind: request.kind,
            status: TxStatus::Pending,
        };
        self.attempts.record(request_id, record.clone()).await?;

        match self.wait_for_confirmation(&hash).await {
            Ok(TxStatus::Confirmed) => {
                record.status = TxStatus::Confirmed;
                self.attempts.record(request_id, record.clone()).await?;
                Ok(record)
            }
            Ok(_) => {
                record.status = TxStatus::Failed;
                self.attempts.record(request_id, record).await?;
                Err(PaymentError::Transaction(format!(
                    "transaction {hash} reverted on chain"
                )))
            }
            // Timeout: the record stays pending so the host can check back.
            Err(e) => Err(e),
        }
    }

    async fn wait_for_confirmation(&self, hash: &TxHash) -> Result<TxStatus> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        let mut consecutive_errors = 0u32;

        loop {
            match self.wallet.transaction_status(hash).await {
                Ok(TxStatus::Pending) => {
                    consecutive_errors = 0;
                }
                Ok(status) => return Ok(status),
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(%hash, %e, attempt = consecutive_errors, "status poll failed");
                    if consecutive_errors > self.config.max_status_retries {
                        return Err(PaymentError::Transaction(format!(
                            "confirmation polling for {hash} failed repeatedly: {e}"
                        )));
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(PaymentError::Transaction(format!(
                    "confirmation of {hash} timed out, transaction still pending"
                )));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
