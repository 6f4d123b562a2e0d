use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use payflow::application::engine::{CheckoutEngine, CheckoutPorts};
use payflow::application::events::CheckoutEvent;
use payflow::application::executor::ExecutorConfig;
use payflow::domain::config::{CheckoutConfig, WalletAddress};
use payflow::domain::currency::CurrencyId;
use payflow::domain::intent::PaymentOutcome;
use payflow::infrastructure::in_memory::InMemoryAttemptStore;
use payflow::infrastructure::simulated::{
    SimulatedRequestApi, SimulatedWallet, StaticRateSource,
};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Simulated payer used by the demo runner.
const DEMO_PAYER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Drives a full checkout against simulated wallet/backend collaborators.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkout configuration JSON file
    scenario: PathBuf,

    /// Simulate an on-chain revert of the payment transaction
    #[arg(long)]
    fail_payment: bool,

    /// Simulate the payer rejecting the signature prompt
    #[arg(long)]
    reject_wallet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let raw = std::fs::read_to_string(&cli.scenario).into_diagnostic()?;
    let config: CheckoutConfig = serde_json::from_str(&raw).into_diagnostic()?;

    let mut wallet = SimulatedWallet::new(WalletAddress::from(DEMO_PAYER));
    if cli.reject_wallet {
        wallet = wallet.reject_signature();
    }
    if cli.fail_payment {
        wallet = wallet.revert_payments(u32::MAX);
    }

    let rates = StaticRateSource::new()
        .with_rate(CurrencyId::from("ETH-mainnet"), dec!(2500))
        .with_rate(CurrencyId::from("ETH-sepolia"), dec!(2500))
        .with_rate(CurrencyId::from("USDC-mainnet"), dec!(1))
        .with_rate(CurrencyId::from("USDT-mainnet"), dec!(1))
        .with_rate(CurrencyId::from("DAI-mainnet"), dec!(1))
        .with_rate(CurrencyId::from("fUSDT-sepolia"), dec!(1))
        .with_rate(CurrencyId::from("FAU-sepolia"), dec!(0.5));

    let ports = CheckoutPorts {
        wallet: Arc::new(wallet),
        api: Arc::new(SimulatedRequestApi::new()),
        rates: Arc::new(rates),
        attempts: Arc::new(InMemoryAttemptStore::new()),
    };
    let executor_config = ExecutorConfig {
        confirmation_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        max_status_retries: 3,
    };

    let (engine, mut events) =
        CheckoutEngine::new(config, ports, executor_config).into_diagnostic()?;

    engine.start().await.into_diagnostic()?;
    let currencies = engine.selectable_currencies().await.into_diagnostic()?;
    let currency = currencies
        .first()
        .ok_or_else(|| miette!("no selectable currencies with a conversion rate"))?;
    let quote = engine.select_currency(&currency.id).await.into_diagnostic()?;
    eprintln!(
        "paying {} {} ({} fee) for {} USD",
        quote.payable_amount,
        currency.symbol,
        quote.fee_amount,
        engine.config().amount_usd
    );

    engine.connect_wallet().await.into_diagnostic()?;
    let outcome = engine.confirm().await.into_diagnostic()?;

    while let Ok(event) = events.try_recv() {
        match event {
            CheckoutEvent::Succeeded { receipt, .. } => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&receipt).into_diagnostic()?
                );
            }
            CheckoutEvent::Failed { error } => {
                eprintln!("payment attempt failed: {error}");
            }
            CheckoutEvent::Completed { step } => {
                eprintln!("checkout completed in step {step:?}");
            }
        }
    }

    match outcome {
        PaymentOutcome::Success { request_id, .. } => {
            eprintln!("settled payment request {request_id}");
            Ok(())
        }
        PaymentOutcome::Failure { error } => Err(error).into_diagnostic(),
    }
}
