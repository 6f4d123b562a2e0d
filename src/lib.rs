//! Checkout orchestration engine for USD-denominated crypto payments.
//!
//! A host application supplies a [`domain::config::CheckoutConfig`] (amount,
//! recipient, supported currencies, optional fee and receipt itemization)
//! and drives [`application::engine::CheckoutEngine`] through the flow:
//! currency selection, wallet connection, confirmation, on-chain execution,
//! settlement. Wallet signing, chain RPC, the payment-request backend and
//! the conversion-rate source are capability traits in [`domain::ports`];
//! the engine calls them but never reimplements them.
//!
//! Terminal outcomes are delivered once per instance over the event channel
//! in [`application::events`], together with a post-success [`Receipt`]
//! snapshot that echoes the USD totals the payer approved.
//!
//! [`Receipt`]: domain::receipt::Receipt

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
