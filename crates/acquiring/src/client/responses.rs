//! Response bodies for the acquiring API.
//!
//! Only the payload fields are modeled here; the shared envelope
//! (`Success`/`ErrorCode`/`Message`/`Details`) is stripped by the client
//! before these types are deserialized.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Amount, AttachStatus, PaymentId, ResponseStatus};

/// Init response: the opened payment session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitResponse {
    pub payment_id: PaymentId,
    pub status: ResponseStatus,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Hosted payment form, present for browser-driven flows
    #[serde(rename = "PaymentURL", default)]
    pub payment_url: Option<String>,
}

/// Check3dsVersion response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Check3dsVersionResponse {
    /// Protocol version the issuer supports, e.g. "1.0.2" or "2.1.0"
    pub version: String,
    /// Directory-server transaction id, only for 2.x
    #[serde(default)]
    pub tds_server_trans_id: Option<String>,
    /// Data-collection endpoint, only for 2.x
    #[serde(default)]
    pub three_ds_method_url: Option<String>,
    #[serde(default)]
    pub payment_system: Option<String>,
}

/// FinishAuthorize response.
///
/// Either carries a terminal/non-terminal payment status or the parameters
/// of a 3-D Secure challenge the customer still has to pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FinishAuthorizeResponse {
    pub payment_id: PaymentId,
    pub status: ResponseStatus,
    #[serde(default)]
    pub amount: Option<Amount>,
    /// Issuer ACS challenge endpoint
    #[serde(rename = "ACSUrl", default)]
    pub acs_url: Option<String>,
    /// v1 challenge: payment authentication request
    #[serde(default)]
    pub pa_req: Option<String>,
    /// v1 challenge: merchant data blob
    #[serde(rename = "MD", default)]
    pub md: Option<String>,
    /// v2 challenge: directory-server transaction id
    #[serde(default)]
    pub tds_server_trans_id: Option<String>,
    /// v2 challenge: ACS transaction id
    #[serde(default)]
    pub acs_trans_id: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub rebill_id: Option<String>,
}

impl FinishAuthorizeResponse {
    /// True when the issuer demands a 3-D Secure challenge before the
    /// payment can proceed.
    pub fn challenge_required(&self) -> bool {
        self.acs_url.is_some() || self.status == ResponseStatus::ThreeDsChecking
    }
}

/// Charge response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChargeResponse {
    pub payment_id: PaymentId,
    pub status: ResponseStatus,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
}

/// GetState response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetStateResponse {
    pub payment_id: PaymentId,
    pub status: ResponseStatus,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// RemoveCard response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveCardResponse {
    pub card_id: String,
    #[serde(default)]
    pub status: Option<crate::models::CardStatus>,
}

/// AddCard response: the opened attach session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddCardResponse {
    pub request_key: String,
}

/// AttachCard response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachCardResponse {
    pub request_key: String,
    #[serde(default)]
    pub status: Option<AttachStatus>,
    #[serde(default)]
    pub card_id: Option<String>,
    /// Issuer ACS challenge endpoint when the check type demands 3-D Secure
    #[serde(rename = "ACSUrl", default)]
    pub acs_url: Option<String>,
    #[serde(default)]
    pub pa_req: Option<String>,
    #[serde(rename = "MD", default)]
    pub md: Option<String>,
}

/// GetAddCardState response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetAddCardStateResponse {
    pub request_key: String,
    pub status: AttachStatus,
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub rebill_id: Option<String>,
}

/// SubmitRandomAmount response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRandomAmountResponse {
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub status: Option<AttachStatus>,
}

/// GetQr / GetStaticQr response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQrResponse {
    /// SBP payload: a deeplink for "PAYLOAD" requests
    pub data: String,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

/// GetTerminalPayMethods response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTerminalPayMethodsResponse {
    pub terminal_info: TerminalInfo,
}

/// Methods a terminal is provisioned for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminalInfo {
    #[serde(default)]
    pub paymethods: Vec<TerminalPayMethod>,
    #[serde(default)]
    pub add_card_scheme: bool,
}

/// A single provisioned pay method with its parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminalPayMethod {
    /// Method name, e.g. "TinkoffPay", "SBP" or "MirPay"
    pub pay_method: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Pay-link response for app-redirect methods.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayLinkResponse {
    pub params: PayLinkParams,
}

/// Parameters of a pay link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayLinkParams {
    /// Deeplink handing the customer off to the bank application
    pub redirect_url: String,
}

/// Submit3dsAuthorization / Submit3DSAuthorizationV2 response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Submit3dsAuthorizationResponse {
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub status: Option<ResponseStatus>,
}

/// Directory-server certificate entry of the app-based 3-D Secure config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryServerCert {
    /// Payment system the certificate belongs to, e.g. "mir" or "visa"
    pub payment_system: String,
    /// Directory-server identifier sent with the authentication request
    pub directory_server_id: String,
    /// PEM-encoded public key
    pub public_key: String,
    #[serde(default)]
    pub algorithm: Option<String>,
}

/// App-based 3-D Secure certificate configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsCertsConfig {
    #[serde(default)]
    pub certs_info: Vec<DirectoryServerCert>,
}
