use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Typed failure surfaced to the host.
///
/// Every error crossing the engine boundary is one of these variants; raw
/// errors from wallet providers, RPC clients or the payment-request backend
/// are classified at the `PaymentExecutor` boundary before they reach the
/// state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Malformed or incomplete host configuration. Fatal, raised before the
    /// checkout starts.
    #[error("configuration error: {0}")]
    Config(String),
    /// Bad input at a step boundary. Recoverable, the step is re-prompted.
    #[error("validation error: {0}")]
    Validation(String),
    /// Wallet connection, network switch or signature rejected. Recoverable,
    /// the flow returns to wallet connection.
    #[error("wallet error: {0}")]
    Wallet(String),
    /// On-chain revert, insufficient funds or confirmation timeout.
    /// Recoverable, the flow returns to confirmation.
    #[error("transaction error: {0}")]
    Transaction(String),
    /// Payment-request backend failure. Recoverable, request creation is
    /// idempotent by reference so a retry is safe.
    #[error("payment api error: {0}")]
    Api(String),
}

/// Discriminant of a [`PaymentError`], used by the state machine to route a
/// failed attempt and by hosts to map errors to actionable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Config,
    Validation,
    Wallet,
    Transaction,
    Api,
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Config(_) => ErrorKind::Config,
            PaymentError::Validation(_) => ErrorKind::Validation,
            PaymentError::Wallet(_) => ErrorKind::Wallet,
            PaymentError::Transaction(_) => ErrorKind::Transaction,
            PaymentError::Api(_) => ErrorKind::Api,
        }
    }
}
