//! Domain model: currencies, configuration, quotes, intents, receipts, and
//! the capability ports the engine is wired with.

pub mod config;
pub mod currency;
pub mod intent;
pub mod ports;
pub mod quote;
pub mod receipt;
