use crate::domain::config::{
    BuyerInfo, CheckoutConfig, CompanyInfo, LineItem, ReceiptTotals, WalletAddress,
};
use crate::domain::currency::{Currency, CurrencyId};
use crate::domain::intent::{PaymentIntent, RequestId, TransactionRecord, TxHash};
use rust_decimal::Decimal;
use serde::Serialize;

/// Post-success snapshot of the settled payment, for display or download.
///
/// Built only after a successful outcome and only from already-confirmed
/// values: the USD totals are echoed from the host configuration and the
/// settled amount comes from the executed intent. Nothing is re-derived
/// through conversion math, so the receipt always matches what the payer
/// approved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    pub company_info: CompanyInfo,
    pub buyer_info: BuyerInfo,
    pub items: Vec<LineItem>,
    pub totals: ReceiptTotals,
    pub paid_currency: CurrencyId,
    pub paid_amount: Decimal,
    pub payer_wallet: WalletAddress,
    pub recipient_wallet: WalletAddress,
    pub request_id: RequestId,
    pub transaction_hashes: Vec<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Assembles the receipt for a settled payment.
///
/// When the host supplied no itemization, a single line item covering the
/// full USD amount is synthesized.
pub fn build_receipt(
    config: &CheckoutConfig,
    currency: &Currency,
    intent: &PaymentIntent,
    request_id: &RequestId,
    transaction_receipts: &[TransactionRecord],
) -> Receipt {
    let (receipt_number, company_info, buyer_info, items, totals) = match &config.receipt_info {
        Some(info) => (
            info.receipt_number.clone(),
            info.company_info.clone(),
            info.buyer_info.clone(),
            info.items.clone(),
            info.totals.clone(),
        ),
        None => (
            None,
            CompanyInfo::default(),
            BuyerInfo::default(),
            vec![LineItem {
                id: "1".to_string(),
                description: "Payment".to_string(),
                quantity: 1,
                unit_price: config.amount_usd,
                discount: Decimal::ZERO,
                tax: Decimal::ZERO,
                total: config.amount_usd,
            }],
            ReceiptTotals {
                total_discount: Decimal::ZERO,
                total_tax: Decimal::ZERO,
                total: config.amount_usd,
                total_usd: config.amount_usd,
            },
        ),
    };

    Receipt {
        receipt_number,
        company_info,
        buyer_info,
        items,
        totals,
        paid_currency: currency.id.clone(),
        paid_amount: intent.payable_amount,
        payer_wallet: intent.payer_wallet.clone(),
        recipient_wallet: intent.recipient_wallet.clone(),
        request_id: request_id.clone(),
        transaction_hashes: transaction_receipts.iter().map(|r| r.hash.clone()).collect(),
        reference: intent.reference.clone(),
    }
}
