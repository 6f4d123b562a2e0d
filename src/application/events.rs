//! Host-facing checkout events.
//!
//! Terminal outcomes are delivered as explicit event payloads over a bounded
//! channel rather than bare callbacks, so duplicate terminal firing can be
//! suppressed by engine state and a slow host cannot block the engine.

use crate::application::engine::Step;
use crate::domain::intent::{RequestId, TransactionRecord};
use crate::domain::receipt::Receipt;
use crate::error::PaymentError;
use tokio::sync::mpsc;

/// Buffer size for the event channel. A checkout emits a handful of events
/// over its whole lifetime, so a small bound is plenty.
pub const EVENT_CHANNEL_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    /// Fired exactly once, when the payment settled.
    Succeeded {
        request_id: RequestId,
        transaction_receipts: Vec<TransactionRecord>,
        receipt: Receipt,
    },
    /// Fired once per failed attempt with the classified error.
    Failed { error: PaymentError },
    /// Fired exactly once, when the machine reaches a terminal step.
    Completed { step: Step },
}

pub type CheckoutEventSender = mpsc::Sender<CheckoutEvent>;
pub type CheckoutEventReceiver = mpsc::Receiver<CheckoutEvent>;

pub fn checkout_event_channel() -> (CheckoutEventSender, CheckoutEventReceiver) {
    mpsc::channel(EVENT_CHANNEL_BUFFER)
}
