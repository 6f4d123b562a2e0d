use crate::domain::config::FeeInfo;
use crate::domain::currency::{Currency, CurrencyId};
use crate::error::{PaymentError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Amount the payer must settle in the selected currency.
///
/// Recomputed whenever the selected currency changes; a quote never outlives
/// the currency it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub currency: CurrencyId,
    /// USD per one unit of the currency, as supplied by the rate source.
    pub rate: Decimal,
    /// Total to pay in the currency, fee included.
    pub payable_amount: Decimal,
    pub fee_amount: Decimal,
}

fn round_half_up(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts the USD amount into the settlement currency and applies the
/// optional percentage fee, rounding half-up to the currency's decimals.
pub fn quote(
    amount_usd: Decimal,
    currency: &Currency,
    rate: Decimal,
    fee_info: Option<&FeeInfo>,
) -> Result<Quote> {
    if amount_usd <= Decimal::ZERO {
        return Err(PaymentError::Validation(format!(
            "cannot quote a non-positive amount: {amount_usd}"
        )));
    }
    if rate <= Decimal::ZERO {
        return Err(PaymentError::Config(format!(
            "invalid conversion rate {rate} for {}",
            currency.id
        )));
    }

    let base = round_half_up(amount_usd / rate, currency.decimals);
    let fee_amount = match fee_info {
        Some(fee) => round_half_up(
            base * fee.fee_percentage / Decimal::ONE_HUNDRED,
            currency.decimals,
        ),
        None => Decimal::ZERO,
    };

    Ok(Quote {
        currency: currency.id.clone(),
        rate,
        payable_amount: base + fee_amount,
        fee_amount,
    })
}
