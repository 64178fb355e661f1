//! Seller payouts
//!
//! Amounts travel as integer cents. Admins type custom amounts in dollars;
//! [`parse_usd_amount`] turns that text into cents and [`resolve_amount`]
//! decides what, if anything, goes in the request body.

use crate::error::{AdminError, Result};
use crate::gateway::{PayoutPreview, PayoutReceipt};
use crate::list::controller::ListController;
use crate::resources::orders::OrderSource;
use tracing::info;

/// Parse a dollar amount such as `"12.5"` or `" $1,200.00 "` into cents.
///
/// The amount is rounded to the nearest cent; zero, negative and
/// non-numeric input are rejected.
pub fn parse_usd_amount(input: &str) -> Result<i64> {
    let invalid = || AdminError::validation("amount", "Enter a valid custom amount in USD.");

    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let dollars: f64 = cleaned.trim().parse().map_err(|_| invalid())?;
    if !dollars.is_finite() {
        return Err(invalid());
    }

    let cents = (dollars * 100.0).round();
    if cents <= 0.0 || cents > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(cents as i64)
}

/// Decide the amount to request.
///
/// A non-empty custom amount wins. Otherwise the remaining balance is paid
/// when positive; with nothing remaining the amount is left to the server.
pub fn resolve_amount(custom: Option<&str>, remaining_cents: i64) -> Result<Option<i64>> {
    match custom.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => parse_usd_amount(text).map(Some),
        None if remaining_cents > 0 => Ok(Some(remaining_cents)),
        None => Ok(None),
    }
}

/// Format cents as `$X.YY`
pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Human description of what a payout will send
pub fn describe_amount(amount_cents: Option<i64>) -> String {
    amount_cents
        .map(format_usd)
        .unwrap_or_else(|| "the remaining amount".to_string())
}

impl ListController<OrderSource> {
    /// Preview what the seller of `order_id` is owed
    pub async fn payout_preview(&self, order_id: &str) -> Result<PayoutPreview> {
        self.source().client().payout_preview(order_id).await
    }

    /// Send a payout and account for it on the loaded order
    pub async fn send_payout(&self, order_id: &str, amount_cents: Option<i64>) -> Result<PayoutReceipt> {
        let receipt = self
            .source()
            .client()
            .send_payout(order_id, amount_cents)
            .await?;
        info!(
            order = order_id,
            amount = %format_usd(receipt.amount_cents),
            transfer = receipt.transfer_id.as_deref().unwrap_or("-"),
            "payout sent"
        );

        let sent = receipt.amount_cents;
        self.update_where(
            |o| o.id == order_id,
            |o| match (receipt.seller_transferred_cents, receipt.seller_remaining_cents) {
                (Some(transferred), Some(remaining)) => {
                    o.seller_transferred_cents = transferred;
                    o.seller_remaining_cents = Some(remaining.max(0));
                }
                _ => o.apply_payout(sent),
            },
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usd_amount() {
        assert_eq!(parse_usd_amount("12.5").unwrap(), 1250);
        assert_eq!(parse_usd_amount(" 0.126 ").unwrap(), 13);
        assert_eq!(parse_usd_amount("$1,200.00").unwrap(), 120_000);
        assert_eq!(parse_usd_amount("19.999").unwrap(), 2000);

        for bad in ["", "abc", "0", "-3", "0.001", "NaN", "inf"] {
            let err = parse_usd_amount(bad).unwrap_err();
            assert!(matches!(err, AdminError::Validation { .. }), "{bad}");
        }
    }

    #[test]
    fn test_resolve_amount() {
        assert_eq!(resolve_amount(Some("5"), 9_000).unwrap(), Some(500));
        assert_eq!(resolve_amount(Some("   "), 9_000).unwrap(), Some(9_000));
        assert_eq!(resolve_amount(None, 0).unwrap(), None);
        assert_eq!(resolve_amount(None, -10).unwrap(), None);
        assert!(resolve_amount(Some("zero"), 9_000).is_err());
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(123_456), "$1234.56");
        assert_eq!(format_usd(-250), "-$2.50");
        assert_eq!(describe_amount(None), "the remaining amount");
        assert_eq!(describe_amount(Some(1999)), "$19.99");
    }
}
