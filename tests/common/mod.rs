use payflow::application::engine::{CheckoutEngine, CheckoutPorts};
use payflow::application::events::CheckoutEventReceiver;
use payflow::application::executor::ExecutorConfig;
use payflow::domain::config::{CheckoutConfig, WalletAddress};
use payflow::domain::currency::CurrencyId;
use payflow::domain::intent::PaymentIntent;
use payflow::infrastructure::in_memory::InMemoryAttemptStore;
use payflow::infrastructure::simulated::{
    SimulatedRequestApi, SimulatedWallet, StaticRateSource,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

pub const RECIPIENT: &str = "0xb07D2398d2004378cad234DA0EF14f1c94A530e4";
pub const PAYER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

pub fn config(amount: Decimal, currencies: &[&str]) -> CheckoutConfig {
    CheckoutConfig {
        amount_usd: amount,
        recipient_wallet: WalletAddress::from(RECIPIENT),
        supported_currencies: currencies.iter().map(|c| CurrencyId::from(*c)).collect(),
        fee_info: None,
        reference: Some("order-42".to_string()),
        receipt_info: None,
    }
}

pub fn fast_executor_config() -> ExecutorConfig {
    ExecutorConfig {
        confirmation_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(5),
        max_status_retries: 3,
    }
}

pub fn default_rates() -> StaticRateSource {
    StaticRateSource::new()
        .with_rate(CurrencyId::from("ETH-sepolia"), dec!(2500))
        .with_rate(CurrencyId::from("fUSDT-sepolia"), dec!(1))
        .with_rate(CurrencyId::from("FAU-sepolia"), dec!(0.5))
}

pub fn intent_for(currency: &str, payable: Decimal) -> PaymentIntent {
    PaymentIntent {
        payer_wallet: WalletAddress::from(PAYER),
        amount_usd: dec!(25.00),
        recipient_wallet: WalletAddress::from(RECIPIENT),
        payment_currency: CurrencyId::from(currency),
        payable_amount: payable,
        fee_amount: Decimal::ZERO,
        reference: Some("order-42".to_string()),
        fee_info: None,
    }
}

pub struct Harness {
    pub engine: Arc<CheckoutEngine>,
    pub events: CheckoutEventReceiver,
    pub wallet: Arc<SimulatedWallet>,
    pub api: Arc<SimulatedRequestApi>,
    pub attempts: InMemoryAttemptStore,
}

pub fn harness(config: CheckoutConfig, wallet: SimulatedWallet) -> Harness {
    harness_full(config, wallet, SimulatedRequestApi::new(), None)
}

pub fn harness_full(
    config: CheckoutConfig,
    wallet: SimulatedWallet,
    api: SimulatedRequestApi,
    max_attempts: Option<u32>,
) -> Harness {
    let wallet = Arc::new(wallet);
    let api = Arc::new(api);
    let attempts = InMemoryAttemptStore::new();
    let ports = CheckoutPorts {
        wallet: wallet.clone(),
        api: api.clone(),
        rates: Arc::new(default_rates()),
        attempts: Arc::new(attempts.clone()),
    };
    let (mut engine, events) =
        CheckoutEngine::new(config, ports, fast_executor_config()).expect("valid config");
    if let Some(max) = max_attempts {
        engine = engine.with_max_attempts(max);
    }
    Harness {
        engine: Arc::new(engine),
        events,
        wallet,
        api,
        attempts,
    }
}

/// Drives the engine up to the confirmation step.
pub async fn drive_to_confirming(harness: &Harness, currency: &str) {
    harness.engine.start().await.unwrap();
    harness
        .engine
        .select_currency(&CurrencyId::from(currency))
        .await
        .unwrap();
    harness.engine.connect_wallet().await.unwrap();
}
