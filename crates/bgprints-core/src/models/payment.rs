use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency the payment backend creates orders in.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Amount in major units (rupees) as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentAmount(pub Decimal);

impl PaymentAmount {
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whole rupees, as the order endpoint takes them. `None` when there are paise.
    pub fn whole_units(&self) -> Option<i64> {
        if self.0.fract() != Decimal::ZERO {
            return None;
        }
        self.0.to_i64()
    }

    /// Amount in minor units (paise), as the gateway expects it.
    ///
    /// Returns `None` for fractional paise or values that overflow `i64`.
    pub fn minor_units(&self) -> Option<i64> {
        let minor = self.0 * Decimal::ONE_HUNDRED;
        if minor.fract() != Decimal::ZERO {
            return None;
        }
        minor.to_i64()
    }
}

impl std::fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gateway order created by the payment backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    /// Minor units
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Identifiers the checkout gateway returns once the user has paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub status: VerificationStatus,
}

/// Everything the checkout surface needs to open a payment sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub key_id: Option<String>,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub merchant_name: String,
    pub prefill: PaymentContact,
}

/// Payer details collected by the payment form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentContact {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_converts_rupees_to_paise() {
        let amount = PaymentAmount(Decimal::from_str("149.50").unwrap());
        assert_eq!(amount.minor_units(), Some(14950));
        assert!(amount.is_positive());
    }

    #[test]
    fn fractional_paise_are_rejected() {
        let amount = PaymentAmount(Decimal::from_str("1.005").unwrap());
        assert_eq!(amount.minor_units(), None);
    }

    #[test]
    fn whole_units_requires_whole_rupees() {
        assert_eq!(PaymentAmount(Decimal::from(250)).whole_units(), Some(250));
        let amount = PaymentAmount(Decimal::from_str("149.50").unwrap());
        assert_eq!(amount.whole_units(), None);
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(!PaymentAmount(Decimal::ZERO).is_positive());
    }

    #[test]
    fn verify_response_parses_status() {
        let resp: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"failure"}"#).unwrap();
        assert_eq!(resp.status, VerificationStatus::Failure);
    }
}
