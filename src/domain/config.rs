use crate::domain::currency::CurrencyId;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An EVM wallet address (`0x` followed by 40 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        let s = &self.0;
        s.len() == 42
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Optional platform fee charged on top of the payable amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeInfo {
    pub fee_address: WalletAddress,
    pub fee_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Buyer identity used only for receipt construction, never for payment math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BuyerInfo {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
}

/// Seller identity printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// One purchased item. Monetary fields are exact decimals, serialized as
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    pub total: Decimal,
}

impl LineItem {
    /// quantity x unit price, minus discount, plus tax.
    pub fn computed_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity) - self.discount + self.tax
    }
}

/// USD totals over all line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTotals {
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub total: Decimal,
    #[serde(rename = "totalUSD")]
    pub total_usd: Decimal,
}

/// Itemization supplied by the host for receipt construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInfo {
    pub buyer_info: BuyerInfo,
    pub company_info: CompanyInfo,
    pub items: Vec<LineItem>,
    pub totals: ReceiptTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
}

/// Host-supplied configuration for one checkout instance.
///
/// Immutable for the lifetime of the checkout; the engine takes a frozen
/// copy rather than reading live host state mid-flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    pub amount_usd: Decimal,
    pub recipient_wallet: WalletAddress,
    pub supported_currencies: Vec<CurrencyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_info: Option<FeeInfo>,
    /// Idempotency key for the payment-request backend. Resubmitting with the
    /// same reference must not create a duplicate charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_info: Option<ReceiptInfo>,
}

impl CheckoutConfig {
    /// Validates the host configuration before the checkout starts.
    ///
    /// A non-positive amount is a `Validation` error (bad user input); every
    /// other defect is a `Config` error and fatal.
    pub fn validate(&self) -> Result<()> {
        if self.amount_usd <= Decimal::ZERO {
            return Err(PaymentError::Validation(format!(
                "amountUsd must be greater than zero, got {}",
                self.amount_usd
            )));
        }
        if !self.recipient_wallet.is_valid() {
            return Err(PaymentError::Config(format!(
                "recipientWallet is not a valid address: {}",
                self.recipient_wallet
            )));
        }
        if self.supported_currencies.is_empty() {
            return Err(PaymentError::Config(
                "supportedCurrencies must not be empty".to_string(),
            ));
        }
        if let Some(fee) = &self.fee_info {
            if !fee.fee_address.is_valid() {
                return Err(PaymentError::Config(format!(
                    "feeAddress is not a valid address: {}",
                    fee.fee_address
                )));
            }
            if fee.fee_percentage < Decimal::ZERO || fee.fee_percentage >= Decimal::ONE_HUNDRED {
                return Err(PaymentError::Config(format!(
                    "feePercentage must be within [0, 100), got {}",
                    fee.fee_percentage
                )));
            }
        }
        if let Some(receipt) = &self.receipt_info {
            self.validate_receipt_info(receipt)?;
        }
        Ok(())
    }

    fn validate_receipt_info(&self, receipt: &ReceiptInfo) -> Result<()> {
        let mut items_total = Decimal::ZERO;
        for item in &receipt.items {
            if item.total != item.computed_total() {
                return Err(PaymentError::Config(format!(
                    "line item {} total {} does not match quantity x unitPrice - discount + tax = {}",
                    item.id,
                    item.total,
                    item.computed_total()
                )));
            }
            items_total += item.total;
        }
        if items_total != receipt.totals.total {
            return Err(PaymentError::Config(format!(
                "line items sum to {} but totals.total is {}",
                items_total, receipt.totals.total
            )));
        }
        // The USD total the payer sees must be the exact amount being charged.
        if receipt.totals.total_usd != self.amount_usd {
            return Err(PaymentError::Config(format!(
                "totals.totalUSD {} does not match amountUsd {}",
                receipt.totals.total_usd, self.amount_usd
            )));
        }
        Ok(())
    }
}
