mod common;

use common::*;
use payflow::application::engine::{CheckoutEngine, CheckoutPorts, Step};
use payflow::application::events::CheckoutEvent;
use payflow::domain::config::WalletAddress;
use payflow::domain::currency::CurrencyId;
use payflow::domain::intent::{PaymentOutcome, TxKind};
use payflow::error::ErrorKind;
use payflow::infrastructure::in_memory::InMemoryAttemptStore;
use payflow::infrastructure::simulated::{
    SimulatedRequestApi, SimulatedWallet, StaticRateSource,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_happy_path_single_native_transaction() {
    // Scenario A: 25.00 USD, one supported currency, no fee config.
    let mut h = harness(
        config(dec!(25.00), &["ETH-sepolia"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );

    h.engine.start().await.unwrap();
    assert_eq!(h.engine.snapshot().await.step, Step::SelectingCurrency);

    let selectable = h.engine.selectable_currencies().await.unwrap();
    assert_eq!(selectable.len(), 1);

    let quote = h
        .engine
        .select_currency(&CurrencyId::from("ETH-sepolia"))
        .await
        .unwrap();
    assert_eq!(quote.payable_amount, dec!(0.01));
    assert_eq!(h.engine.snapshot().await.step, Step::ConnectingWallet);

    let payer = h.engine.connect_wallet().await.unwrap();
    assert_eq!(payer, WalletAddress::from(PAYER));
    assert_eq!(h.engine.snapshot().await.step, Step::Confirming);

    let outcome = h.engine.confirm().await.unwrap();
    let request_id = match outcome {
        PaymentOutcome::Success {
            request_id,
            transaction_receipts,
        } => {
            assert_eq!(transaction_receipts.len(), 1);
            request_id
        }
        PaymentOutcome::Failure { error } => panic!("expected success, got {error}"),
    };
    assert!(!request_id.as_str().is_empty());
    assert_eq!(h.engine.snapshot().await.step, Step::Succeeded);

    // Exactly one transaction: native ETH needs no approval.
    assert_eq!(h.wallet.submitted(TxKind::Approval), 0);
    assert_eq!(h.wallet.submitted(TxKind::Payment), 1);

    match h.events.try_recv().unwrap() {
        CheckoutEvent::Succeeded { receipt, .. } => {
            assert_eq!(receipt.totals.total_usd, dec!(25.00));
            assert_eq!(receipt.paid_currency, CurrencyId::from("ETH-sepolia"));
            assert_eq!(receipt.paid_amount, dec!(0.01));
        }
        other => panic!("expected Succeeded, got {other:?}"),
    }
    match h.events.try_recv().unwrap() {
        CheckoutEvent::Completed { step } => assert_eq!(step, Step::Succeeded),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_amount_fails_before_selecting() {
    // Scenario B: amountUsd = 0 never reaches SelectingCurrency.
    let ports = CheckoutPorts {
        wallet: Arc::new(SimulatedWallet::new(WalletAddress::from(PAYER))),
        api: Arc::new(SimulatedRequestApi::new()),
        rates: Arc::new(default_rates()),
        attempts: Arc::new(InMemoryAttemptStore::new()),
    };
    let err = CheckoutEngine::new(
        config(Decimal::ZERO, &["ETH-sepolia"]),
        ports,
        fast_executor_config(),
    )
    .err()
    .expect("zero amount must be rejected");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_empty_currencies_is_config_error() {
    let ports = CheckoutPorts {
        wallet: Arc::new(SimulatedWallet::new(WalletAddress::from(PAYER))),
        api: Arc::new(SimulatedRequestApi::new()),
        rates: Arc::new(default_rates()),
        attempts: Arc::new(InMemoryAttemptStore::new()),
    };
    let err = CheckoutEngine::new(config(dec!(25.00), &[]), ports, fast_executor_config())
        .err()
        .expect("empty currency set must be rejected");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_currency_without_rate_is_excluded() {
    let wallet = SimulatedWallet::new(WalletAddress::from(PAYER));
    let api = Arc::new(SimulatedRequestApi::new());
    // Rate table only knows ETH-sepolia.
    let rates = StaticRateSource::new().with_rate(CurrencyId::from("ETH-sepolia"), dec!(2500));
    let ports = CheckoutPorts {
        wallet: Arc::new(wallet),
        api,
        rates: Arc::new(rates),
        attempts: Arc::new(InMemoryAttemptStore::new()),
    };
    let (engine, _events) = CheckoutEngine::new(
        config(dec!(25.00), &["ETH-sepolia", "FAU-sepolia"]),
        ports,
        fast_executor_config(),
    )
    .unwrap();

    engine.start().await.unwrap();
    let selectable = engine.selectable_currencies().await.unwrap();
    assert_eq!(selectable.len(), 1);
    assert_eq!(selectable[0].id, CurrencyId::from("ETH-sepolia"));
}

#[tokio::test]
async fn test_unknown_supported_currency_is_config_error() {
    let h = harness(
        config(dec!(25.00), &["DOGE-moonnet"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );
    h.engine.start().await.unwrap();
    let err = h.engine.selectable_currencies().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_currency_change_while_confirming_refreshes_quote() {
    let mut h = harness(
        config(dec!(25.00), &["ETH-sepolia", "FAU-sepolia"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );
    drive_to_confirming(&h, "ETH-sepolia").await;
    assert_eq!(
        h.engine.current_quote().await.unwrap().payable_amount,
        dec!(0.01)
    );

    // Switching currency at confirmation invalidates the previous quote and
    // keeps the payer on the confirmation step.
    let quote = h
        .engine
        .select_currency(&CurrencyId::from("FAU-sepolia"))
        .await
        .unwrap();
    assert_eq!(quote.payable_amount, dec!(50));
    assert_eq!(h.engine.snapshot().await.step, Step::Confirming);

    let outcome = h.engine.confirm().await.unwrap();
    assert!(outcome.is_success());

    // The executed amount is the refreshed one, not the stale ETH quote.
    match h.events.try_recv().unwrap() {
        CheckoutEvent::Succeeded { receipt, .. } => {
            assert_eq!(receipt.paid_currency, CurrencyId::from("FAU-sepolia"));
            assert_eq!(receipt.paid_amount, dec!(50));
        }
        other => panic!("expected Succeeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsupported_selection_rejected() {
    let h = harness(
        config(dec!(25.00), &["ETH-sepolia"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );
    h.engine.start().await.unwrap();
    let err = h
        .engine
        .select_currency(&CurrencyId::from("FAU-sepolia"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_steps_are_ordered() {
    let h = harness(
        config(dec!(25.00), &["ETH-sepolia"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );

    // No currency listing, confirm or connect before the relevant step.
    assert!(h.engine.selectable_currencies().await.is_err());
    assert!(h.engine.confirm().await.is_err());
    assert!(h.engine.connect_wallet().await.is_err());

    h.engine.start().await.unwrap();
    assert!(h.engine.selectable_currencies().await.is_ok());
    assert!(h.engine.confirm().await.is_err());
    // Starting twice is rejected.
    assert!(h.engine.start().await.is_err());
}

#[tokio::test]
async fn test_cancel_walks_back_one_step() {
    let h = harness(
        config(dec!(25.00), &["ETH-sepolia"]),
        SimulatedWallet::new(WalletAddress::from(PAYER)),
    );
    drive_to_confirming(&h, "ETH-sepolia").await;

    h.engine.cancel().await.unwrap();
    assert_eq!(h.engine.snapshot().await.step, Step::ConnectingWallet);

    h.engine.cancel().await.unwrap();
    let snapshot = h.engine.snapshot().await;
    assert_eq!(snapshot.step, Step::SelectingCurrency);
    assert_eq!(snapshot.selected_currency, None);

    // Nothing left to cancel.
    assert!(h.engine.cancel().await.is_err());
}
