//! Application layer: the checkout state machine and the payment executor.
//!
//! `CheckoutEngine` owns the step sequencing and holds accumulated
//! selections; `PaymentExecutor` turns one frozen intent into on-chain
//! transactions. Events flow to the host over the channel defined in
//! `events`.

pub mod engine;
pub mod events;
pub mod executor;
