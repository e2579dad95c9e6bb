//! Options describing a single payment attempt.

use serde::{Deserialize, Serialize};

use crate::models::Amount;
use crate::Error;

/// Order part of the payment options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOptions {
    /// Merchant-side order identifier, unique per terminal
    pub order_id: String,
    /// Amount to charge, in minor units
    pub amount: Amount,
    /// Whether this order registers a recurrence consent
    pub recurrent: bool,
    /// Order description shown on the payment form
    pub description: Option<String>,
    /// Fiscal receipt payload, passed through to the API verbatim
    pub receipt: Option<serde_json::Value>,
}

/// Customer part of the payment options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOptions {
    /// Merchant-side customer identifier
    pub customer_key: String,
    /// E-mail for the fiscal receipt
    pub email: Option<String>,
    /// Card check mode applied when the customer saves a card
    pub check_type: CheckType,
}

/// Card check mode used when a customer key is attached to a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    /// No check
    #[default]
    #[serde(rename = "NO")]
    No,
    /// Hold a small amount and reverse it
    #[serde(rename = "HOLD")]
    Hold,
    /// Run a 3-D Secure check
    #[serde(rename = "3DS")]
    ThreeDs,
    /// Hold plus 3-D Secure
    #[serde(rename = "3DSHOLD")]
    ThreeDsHold,
}

/// Feature flags tweaking process behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesOptions {
    /// Emit duplicate e-mail notifications from the bank side
    pub duplicate_email_to_merchant: bool,
}

/// Everything a payment process needs to start one attempt.
///
/// Immutable after construction; processes clone it per attempt and never
/// mutate it. [`PaymentOptions::new`] validates required fields up front so
/// a malformed configuration fails before any network call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOptions {
    /// Order being paid
    pub order: OrderOptions,
    /// Customer attribution, when known
    pub customer: Option<CustomerOptions>,
    /// Feature flags
    pub features: FeaturesOptions,
}

impl PaymentOptions {
    /// Build validated payment options.
    pub fn new(
        order: OrderOptions,
        customer: Option<CustomerOptions>,
        features: FeaturesOptions,
    ) -> Result<Self, Error> {
        if order.order_id.trim().is_empty() {
            return Err(Error::InvalidOptions("order id must not be empty".into()));
        }
        if order.amount.0 == 0 {
            return Err(Error::InvalidOptions("amount must be positive".into()));
        }
        if let Some(customer) = &customer {
            if customer.customer_key.trim().is_empty() {
                return Err(Error::InvalidOptions(
                    "customer key must not be empty".into(),
                ));
            }
        }
        Ok(Self {
            order,
            customer,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_id: &str, amount: u64) -> OrderOptions {
        OrderOptions {
            order_id: order_id.to_string(),
            amount: amount.into(),
            recurrent: false,
            description: None,
            receipt: None,
        }
    }

    #[test]
    fn empty_order_id_is_rejected() {
        let err = PaymentOptions::new(order("  ", 100), None, FeaturesOptions::default())
            .expect_err("blank order id must not validate");
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = PaymentOptions::new(order("order-1", 0), None, FeaturesOptions::default())
            .expect_err("zero amount must not validate");
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[test]
    fn valid_options_pass() {
        PaymentOptions::new(order("order-1", 100), None, FeaturesOptions::default())
            .expect("valid options");
    }
}
