use crate::application::events::{
    checkout_event_channel, CheckoutEvent, CheckoutEventReceiver, CheckoutEventSender,
};
use crate::application::executor::{ExecutorConfig, PaymentExecutor};
use crate::domain::config::{CheckoutConfig, WalletAddress};
use crate::domain::currency::{Currency, CurrencyId};
use crate::domain::intent::{PaymentIntent, PaymentOutcome};
use crate::domain::ports::{
    AttemptStoreRef, PaymentRequestApiRef, RateSourceRef, WalletAdapterRef,
};
use crate::domain::quote::{quote, Quote};
use crate::domain::receipt::build_receipt;
use crate::error::{ErrorKind, PaymentError, Result};
use serde::Serialize;
use tokio::sync::RwLock;

/// Failed attempts allowed before the checkout becomes terminally failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Current step of the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Idle,
    SelectingCurrency,
    ConnectingWallet,
    Confirming,
    Executing,
    Succeeded,
    Failed,
}

/// Read-only projection of the engine for host-rendered progress UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSnapshot {
    pub step: Step,
    pub selected_currency: Option<CurrencyId>,
    pub is_executing: bool,
}

/// Capability implementations the engine is wired with.
#[derive(Clone)]
pub struct CheckoutPorts {
    pub wallet: WalletAdapterRef,
    pub api: PaymentRequestApiRef,
    pub rates: RateSourceRef,
    pub attempts: AttemptStoreRef,
}

struct EngineState {
    step: Step,
    selected: Option<Currency>,
    quote: Option<Quote>,
    payer: Option<WalletAddress>,
    /// Bumped on every confirm and on cancel-while-executing; an executor
    /// outcome whose sequence no longer matches is discarded.
    attempt_seq: u64,
    failed_attempts: u32,
    terminal_notified: bool,
}

/// The checkout orchestration state machine.
///
/// Owns the flow `Idle -> SelectingCurrency -> ConnectingWallet -> Confirming
/// -> Executing -> Succeeded | Failed` for one checkout instance. All methods
/// take `&self`; state lives behind a lock so that a second driver call
/// arriving while an attempt is in flight is rejected rather than queued.
/// Independent instances share nothing and can run concurrently.
pub struct CheckoutEngine {
    config: CheckoutConfig,
    wallet: WalletAdapterRef,
    rates: RateSourceRef,
    executor: PaymentExecutor,
    state: RwLock<EngineState>,
    events: CheckoutEventSender,
    max_attempts: u32,
}

impl CheckoutEngine {
    /// Validates the host configuration and builds the engine together with
    /// the receiver for its lifecycle events.
    pub fn new(
        config: CheckoutConfig,
        ports: CheckoutPorts,
        executor_config: ExecutorConfig,
    ) -> Result<(Self, CheckoutEventReceiver)> {
        config.validate()?;
        let (events, receiver) = checkout_event_channel();
        let executor = PaymentExecutor::new(
            ports.wallet.clone(),
            ports.api,
            ports.attempts,
            executor_config,
        );
        let engine = Self {
            config,
            wallet: ports.wallet,
            rates: ports.rates,
            executor,
            state: RwLock::new(EngineState {
                step: Step::Idle,
                selected: None,
                quote: None,
                payer: None,
                attempt_seq: 0,
                failed_attempts: 0,
                terminal_notified: false,
            }),
            events,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        };
        Ok((engine, receiver))
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> CheckoutSnapshot {
        let state = self.state.read().await;
        CheckoutSnapshot {
            step: state.step,
            selected_currency: state.selected.as_ref().map(|c| c.id.clone()),
            is_executing: state.step == Step::Executing,
        }
    }

    /// Current quote for the selected currency, if one has been computed.
    pub async fn current_quote(&self) -> Option<Quote> {
        self.state.read().await.quote.clone()
    }

    /// Starts the checkout: `Idle -> SelectingCurrency`.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.step != Step::Idle {
            return Err(PaymentError::Validation(
                "checkout has already started".to_string(),
            ));
        }
        if self.config.supported_currencies.is_empty() {
            return Err(PaymentError::Config(
                "no supported currencies configured".to_string(),
            ));
        }
        state.step = Step::SelectingCurrency;
        tracing::info!("checkout started");
        Ok(())
    }

    /// Supported currencies the payer can actually settle with.
    ///
    /// A supported id missing from the catalog is a configuration error; a
    /// currency without a conversion rate is excluded from the result rather
    /// than silently defaulting.
    pub async fn selectable_currencies(&self) -> Result<Vec<Currency>> {
        {
            let state = self.state.read().await;
            match state.step {
                Step::SelectingCurrency | Step::ConnectingWallet | Step::Confirming => {}
                step => {
                    return Err(PaymentError::Validation(format!(
                        "cannot list currencies in step {step:?}"
                    )));
                }
            }
        }

        let mut selectable = Vec::new();
        for id in &self.config.supported_currencies {
            let currency = Currency::lookup(id).ok_or_else(|| {
                PaymentError::Config(format!("supported currency {id} is not in the catalog"))
            })?;
            match self.rates.usd_rate(id).await {
                Ok(_) => selectable.push(currency),
                Err(e) => {
                    tracing::warn!(currency = %id, %e, "excluding currency without a rate");
                }
            }
        }
        Ok(selectable)
    }

    /// Picks (or replaces) the settlement currency and recomputes the quote.
    ///
    /// Allowed in any pre-execution step; replacing the currency while
    /// confirming invalidates the previous quote so a stale amount can never
    /// reach the executor. Rejected while an attempt is in flight.
    pub async fn select_currency(&self, id: &CurrencyId) -> Result<Quote> {
        {
            let state = self.state.read().await;
            match state.step {
                Step::SelectingCurrency | Step::ConnectingWallet | Step::Confirming => {}
                Step::Executing => {
                    return Err(PaymentError::Validation(
                        "currency is frozen while a payment attempt is in flight".to_string(),
                    ));
                }
                _ => {
                    return Err(PaymentError::Validation(format!(
                        "cannot select a currency in step {:?}",
                        state.step
                    )));
                }
            }
        }

        if !self.config.supported_currencies.contains(id) {
            return Err(PaymentError::Validation(format!(
                "currency {id} is not offered by this checkout"
            )));
        }
        let currency = Currency::lookup(id).ok_or_else(|| {
            PaymentError::Config(format!("supported currency {id} is not in the catalog"))
        })?;
        let rate = self.rates.usd_rate(id).await?;
        let new_quote = quote(
            self.config.amount_usd,
            &currency,
            rate,
            self.config.fee_info.as_ref(),
        )?;

        let mut state = self.state.write().await;
        // Re-check: the step may have moved while the rate was fetched.
        match state.step {
            Step::SelectingCurrency => state.step = Step::ConnectingWallet,
            Step::ConnectingWallet | Step::Confirming => {}
            _ => {
                return Err(PaymentError::Validation(
                    "checkout moved on while computing the quote".to_string(),
                ));
            }
        }
        tracing::info!(currency = %id, payable = %new_quote.payable_amount, "currency selected");
        state.selected = Some(currency);
        state.quote = Some(new_quote.clone());
        Ok(new_quote)
    }

    /// Connects the wallet and moves to confirmation once an address is
    /// available on the right network.
    pub async fn connect_wallet(&self) -> Result<WalletAddress> {
        let network = {
            let state = self.state.read().await;
            if state.step != Step::ConnectingWallet {
                return Err(PaymentError::Validation(format!(
                    "cannot connect a wallet in step {:?}",
                    state.step
                )));
            }
            let selected = state.selected.as_ref().ok_or_else(|| {
                PaymentError::Validation("no currency selected".to_string())
            })?;
            selected.network
        };

        let address = self.wallet.connect().await?;
        self.wallet.ensure_network(network).await?;

        let mut state = self.state.write().await;
        if state.step != Step::ConnectingWallet {
            return Err(PaymentError::Validation(
                "checkout moved on while connecting the wallet".to_string(),
            ));
        }
        tracing::info!(payer = %address, %network, "wallet connected");
        state.payer = Some(address.clone());
        state.step = Step::Confirming;
        Ok(address)
    }

    /// Explicit payer confirmation: builds a fresh [`PaymentIntent`] from the
    /// current selection and runs the executor.
    ///
    /// A second confirm while an attempt is in flight is rejected. The
    /// outcome is returned and also delivered through the event channel; on
    /// failure the flow returns to `Confirming` (or `ConnectingWallet` for
    /// wallet errors) until `max_attempts` is exhausted, which makes the
    /// failure terminal. If the attempt was cancelled while in flight its
    /// outcome is discarded and a `Validation` error is returned instead.
    pub async fn confirm(&self) -> Result<PaymentOutcome> {
        let (intent, currency, seq) = {
            let mut state = self.state.write().await;
            if state.step == Step::Executing {
                return Err(PaymentError::Validation(
                    "a payment attempt is already in flight".to_string(),
                ));
            }
            if state.step != Step::Confirming {
                return Err(PaymentError::Validation(format!(
                    "cannot confirm in step {:?}",
                    state.step
                )));
            }
            let currency = state
                .selected
                .clone()
                .ok_or_else(|| PaymentError::Validation("no currency selected".to_string()))?;
            let current_quote = state
                .quote
                .clone()
                .ok_or_else(|| PaymentError::Validation("no payable amount computed".to_string()))?;
            let payer = state
                .payer
                .clone()
                .ok_or_else(|| PaymentError::Validation("wallet is not connected".to_string()))?;

            let intent = PaymentIntent {
                payer_wallet: payer,
                amount_usd: self.config.amount_usd,
                recipient_wallet: self.config.recipient_wallet.clone(),
                payment_currency: currency.id.clone(),
                payable_amount: current_quote.payable_amount,
                fee_amount: current_quote.fee_amount,
                reference: self.config.reference.clone(),
                fee_info: self.config.fee_info.clone(),
            };

            state.step = Step::Executing;
            state.attempt_seq += 1;
            (intent, currency, state.attempt_seq)
        };

        let outcome = self.executor.execute(&intent).await;

        let mut state = self.state.write().await;
        if state.attempt_seq != seq || state.step != Step::Executing {
            // The payer cancelled while the attempt was in flight; its result
            // is stale and must not move the machine or reach the host.
            tracing::info!(seq, "discarding outcome of a cancelled attempt");
            return Err(PaymentError::Validation(
                "payment attempt was cancelled".to_string(),
            ));
        }

        match &outcome {
            PaymentOutcome::Success {
                request_id,
                transaction_receipts,
            } => {
                state.step = Step::Succeeded;
                let receipt = build_receipt(
                    &self.config,
                    &currency,
                    &intent,
                    request_id,
                    transaction_receipts,
                );
                self.emit(CheckoutEvent::Succeeded {
                    request_id: request_id.clone(),
                    transaction_receipts: transaction_receipts.clone(),
                    receipt,
                });
                self.notify_terminal(&mut state);
            }
            PaymentOutcome::Failure { error } => {
                state.failed_attempts += 1;
                self.emit(CheckoutEvent::Failed {
                    error: error.clone(),
                });
                if state.failed_attempts >= self.max_attempts {
                    state.step = Step::Failed;
                    self.notify_terminal(&mut state);
                } else if error.kind() == ErrorKind::Wallet {
                    state.step = Step::ConnectingWallet;
                } else {
                    state.step = Step::Confirming;
                }
            }
        }
        Ok(outcome)
    }

    /// Cancels the current step and returns to the prior one.
    ///
    /// Cancelling while executing abandons the in-flight attempt: the watch
    /// may still finish in the background but its result is discarded.
    pub async fn cancel(&self) -> Result<()> {
        let mut state = self.state.write().await;
        match state.step {
            Step::ConnectingWallet => {
                state.step = Step::SelectingCurrency;
                state.selected = None;
                state.quote = None;
            }
            Step::Confirming => {
                state.step = Step::ConnectingWallet;
            }
            Step::Executing => {
                state.attempt_seq += 1;
                state.step = Step::Confirming;
            }
            step => {
                return Err(PaymentError::Validation(format!(
                    "nothing to cancel in step {step:?}"
                )));
            }
        }
        tracing::info!(step = ?state.step, "step cancelled");
        Ok(())
    }

    fn emit(&self, event: CheckoutEvent) {
        if let Err(e) = self.events.try_send(event) {
            tracing::warn!(%e, "dropping checkout event");
        }
    }

    fn notify_terminal(&self, state: &mut EngineState) {
        if state.terminal_notified {
            return;
        }
        state.terminal_notified = true;
        self.emit(CheckoutEvent::Completed { step: state.step });
    }
}
