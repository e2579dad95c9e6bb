//! Request bodies for the acquiring API.
//!
//! Field names follow the wire protocol (PascalCase, `DATA` for the
//! free-form extras map). The client injects `TerminalKey` and `Token`
//! before sending, so requests never carry credentials themselves.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Amount, CheckType, PaymentId, PaymentOptions};

/// Init: open a payment session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitRequest {
    /// Merchant order identifier
    pub order_id: String,
    /// Amount in minor units
    pub amount: Amount,
    /// "Y" when the order registers a recurrence consent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fiscal receipt payload, excluded from token signing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<serde_json::Value>,
    /// Free-form extras, excluded from token signing
    #[serde(rename = "DATA", skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

impl InitRequest {
    /// Build an Init request from validated payment options.
    pub fn from_options(options: &PaymentOptions) -> Self {
        Self {
            order_id: options.order.order_id.clone(),
            amount: options.order.amount,
            recurrent: options.order.recurrent.then(|| "Y".to_string()),
            customer_key: options
                .customer
                .as_ref()
                .map(|customer| customer.customer_key.clone()),
            description: options.order.description.clone(),
            receipt: options.order.receipt.clone(),
            data: None,
        }
    }

    /// Attach a free-form extras entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Check3dsVersion: ask which 3-D Secure version applies to a card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Check3dsVersionRequest {
    pub payment_id: PaymentId,
    /// Encrypted card payload
    pub card_data: String,
}

/// FinishAuthorize: submit card data and complete the authorization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FinishAuthorizeRequest {
    pub payment_id: PaymentId,
    /// Encrypted card payload
    pub card_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Device fingerprint data for app-based 3-D Secure, excluded from
    /// token signing
    #[serde(rename = "DATA", skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

/// Charge: execute a recurring payment against a stored consent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChargeRequest {
    pub payment_id: PaymentId,
    pub rebill_id: String,
}

/// GetState: fetch the current status of a payment session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetStateRequest {
    pub payment_id: PaymentId,
}

/// GetCardList: list the cards saved for a customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCardListRequest {
    pub customer_key: String,
}

/// RemoveCard: detach a saved card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveCardRequest {
    pub customer_key: String,
    pub card_id: String,
}

/// AddCard: open a card-attach session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddCardRequest {
    pub customer_key: String,
    pub check_type: CheckType,
}

/// AttachCard: submit the card being attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachCardRequest {
    pub request_key: String,
    /// Encrypted card payload
    pub card_data: String,
    #[serde(rename = "DATA", skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

/// GetAddCardState: fetch the current status of a card-attach session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetAddCardStateRequest {
    pub request_key: String,
}

/// SubmitRandomAmount: confirm an attach via the debited random amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRandomAmountRequest {
    pub request_key: String,
    /// Amount the customer observed, in minor units
    pub amount: Amount,
}

/// GetQr: request an SBP payload for a payment session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQrRequest {
    pub payment_id: PaymentId,
    /// "PAYLOAD" for a deeplink, "IMAGE" for an SVG
    pub data_type: String,
}

impl GetQrRequest {
    /// Deeplink payload request for the given payment.
    pub fn payload(payment_id: PaymentId) -> Self {
        Self {
            payment_id,
            data_type: "PAYLOAD".to_string(),
        }
    }
}

/// GetStaticQr: request the terminal's reusable SBP payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetStaticQrRequest {
    /// "PAYLOAD" for a deeplink, "IMAGE" for an SVG
    pub data_type: String,
}

/// Submit3dsAuthorization: post a browser-flow challenge result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Submit3dsAuthorizationRequest {
    #[serde(rename = "MD")]
    pub md: String,
    pub pa_res: String,
}

/// Submit3DSAuthorizationV2: post an app-based challenge result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Submit3dsAuthorizationV2Request {
    pub payment_id: PaymentId,
}
