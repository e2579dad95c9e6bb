//! Typed HTTP client for the acquiring API.
//!
//! Every call POSTs a JSON body to `<base_url>/<Operation>`, with
//! `TerminalKey` and the computed `Token` injected into the top-level
//! object. Responses share an envelope (`Success`, `ErrorCode`, `Message`,
//! `Details`) that is checked and stripped before the payload is
//! deserialized.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::models::{Card, PaymentId};
use crate::Error;

mod api;
mod requests;
mod responses;
mod signing;

pub use api::AcquiringApi;
pub use requests::{
    AddCardRequest, AttachCardRequest, ChargeRequest, Check3dsVersionRequest,
    FinishAuthorizeRequest, GetAddCardStateRequest, GetCardListRequest, GetQrRequest,
    GetStateRequest, GetStaticQrRequest, InitRequest, RemoveCardRequest,
    Submit3dsAuthorizationRequest, Submit3dsAuthorizationV2Request, SubmitRandomAmountRequest,
};
pub use responses::{
    AddCardResponse, AttachCardResponse, ChargeResponse, Check3dsVersionResponse,
    DirectoryServerCert, FinishAuthorizeResponse, GetAddCardStateResponse, GetQrResponse,
    GetStateResponse, GetTerminalPayMethodsResponse, InitResponse, PayLinkParams, PayLinkResponse,
    RemoveCardResponse, Submit3dsAuthorizationResponse, SubmitRandomAmountResponse, TerminalInfo,
    TerminalPayMethod, ThreeDsCertsConfig,
};
pub use signing::{PasswordTokenSigner, TokenSigner};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

/// Reqwest-backed implementation of [`AcquiringApi`].
#[derive(Clone)]
pub struct AcquiringClient {
    http: reqwest::Client,
    base_url: Url,
    certs_config_url: Option<Url>,
    terminal_key: String,
    signer: Arc<dyn TokenSigner>,
}

impl AcquiringClient {
    /// Create a client for the given terminal.
    ///
    /// `base_url` must end with a slash for endpoint joining to behave,
    /// e.g. `https://securepay.example.com/v2/`.
    pub fn new(
        base_url: &str,
        terminal_key: impl Into<String>,
        signer: Arc<dyn TokenSigner>,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            certs_config_url: None,
            terminal_key: terminal_key.into(),
            signer,
        })
    }

    /// Point the client at a certificate configuration document.
    pub fn with_certs_config_url(mut self, url: &str) -> Result<Self, Error> {
        self.certs_config_url = Some(Url::parse(url)?);
        Ok(self)
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R, Error> {
        let mut payload = serde_json::to_value(body)?;
        let object = payload
            .as_object_mut()
            .ok_or_else(|| Error::Custom("request body must be a JSON object".to_string()))?;
        object.insert(
            "TerminalKey".to_string(),
            Value::String(self.terminal_key.clone()),
        );
        let token = self.signer.sign(&signable_params(object));
        object.insert("Token".to_string(), Value::String(token));

        let url = self.base_url.join(operation)?;
        tracing::debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let envelope: Value = response.json().await?;
        parse_envelope(envelope)
    }
}

/// Scalar top-level fields of the request, as signed by the token. Nested
/// objects (Receipt, DATA) and nulls are excluded per the wire contract.
fn signable_params(object: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key.clone(), text.clone())),
            Value::Number(number) => Some((key.clone(), number.to_string())),
            Value::Bool(flag) => Some((key.clone(), flag.to_string())),
            _ => None,
        })
        .collect()
}

fn parse_envelope<R: DeserializeOwned>(body: Value) -> Result<R, Error> {
    if let Some(object) = body.as_object() {
        let success = object
            .get("Success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let error_code = object
            .get("ErrorCode")
            .and_then(Value::as_str)
            .unwrap_or("0")
            .to_string();
        if !success || error_code != "0" {
            let message = object
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("request declined")
                .to_string();
            let details = object
                .get("Details")
                .and_then(Value::as_str)
                .map(str::to_string);
            let payment_id = object.get("PaymentId").and_then(payment_id_from_value);
            return Err(Error::Api {
                error_code,
                message,
                details,
                payment_id,
            });
        }
    }
    Ok(serde_json::from_value(body)?)
}

fn payment_id_from_value(value: &Value) -> Option<PaymentId> {
    match value {
        Value::Number(number) => number.as_u64().map(PaymentId),
        Value::String(text) => text.parse::<u64>().ok().map(PaymentId),
        _ => None,
    }
}

#[async_trait::async_trait]
impl AcquiringApi for AcquiringClient {
    #[instrument(skip_all, fields(order_id = %request.order_id))]
    async fn init(&self, request: InitRequest) -> Result<InitResponse, Error> {
        self.call("Init", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn check_3ds_version(
        &self,
        request: Check3dsVersionRequest,
    ) -> Result<Check3dsVersionResponse, Error> {
        self.call("Check3dsVersion", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn finish_authorize(
        &self,
        request: FinishAuthorizeRequest,
    ) -> Result<FinishAuthorizeResponse, Error> {
        self.call("FinishAuthorize", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, Error> {
        self.call("Charge", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse, Error> {
        self.call("GetState", &request).await
    }

    #[instrument(skip_all)]
    async fn get_card_list(&self, request: GetCardListRequest) -> Result<Vec<Card>, Error> {
        self.call("GetCardList", &request).await
    }

    #[instrument(skip_all, fields(card_id = %request.card_id))]
    async fn remove_card(&self, request: RemoveCardRequest) -> Result<RemoveCardResponse, Error> {
        self.call("RemoveCard", &request).await
    }

    #[instrument(skip_all)]
    async fn add_card(&self, request: AddCardRequest) -> Result<AddCardResponse, Error> {
        self.call("AddCard", &request).await
    }

    #[instrument(skip_all)]
    async fn attach_card(&self, request: AttachCardRequest) -> Result<AttachCardResponse, Error> {
        self.call("AttachCard", &request).await
    }

    #[instrument(skip_all)]
    async fn get_add_card_state(
        &self,
        request: GetAddCardStateRequest,
    ) -> Result<GetAddCardStateResponse, Error> {
        self.call("GetAddCardState", &request).await
    }

    #[instrument(skip_all)]
    async fn submit_random_amount(
        &self,
        request: SubmitRandomAmountRequest,
    ) -> Result<SubmitRandomAmountResponse, Error> {
        self.call("SubmitRandomAmount", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn get_qr(&self, request: GetQrRequest) -> Result<GetQrResponse, Error> {
        self.call("GetQr", &request).await
    }

    #[instrument(skip_all)]
    async fn get_static_qr(&self, request: GetStaticQrRequest) -> Result<GetQrResponse, Error> {
        self.call("GetStaticQr", &request).await
    }

    #[instrument(skip_all)]
    async fn get_terminal_pay_methods(&self) -> Result<GetTerminalPayMethodsResponse, Error> {
        let mut url = self.base_url.join("GetTerminalPayMethods")?;
        url.query_pairs_mut()
            .append_pair("TerminalKey", &self.terminal_key)
            .append_pair("PaySource", "SDK");
        let response = self.http.get(url).send().await?.error_for_status()?;
        parse_envelope(response.json().await?)
    }

    #[instrument(skip_all, fields(payment_id = %payment_id))]
    async fn get_tinkoff_pay_link(
        &self,
        payment_id: PaymentId,
        version: &str,
    ) -> Result<PayLinkResponse, Error> {
        let path = format!("TinkoffPay/transactions/{payment_id}/versions/{version}/link");
        let url = self.base_url.join(&path)?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        parse_envelope(response.json().await?)
    }

    #[instrument(skip_all, fields(payment_id = %payment_id))]
    async fn get_mir_pay_link(&self, payment_id: PaymentId) -> Result<PayLinkResponse, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct GetMirPayLinkRequest {
            payment_id: PaymentId,
        }
        self.call("MirPay/GetMirPayLink", &GetMirPayLinkRequest { payment_id })
            .await
    }

    #[instrument(skip_all)]
    async fn submit_3ds_authorization(
        &self,
        request: Submit3dsAuthorizationRequest,
    ) -> Result<Submit3dsAuthorizationResponse, Error> {
        self.call("Submit3DSAuthorization", &request).await
    }

    #[instrument(skip_all, fields(payment_id = %request.payment_id))]
    async fn submit_3ds_authorization_v2(
        &self,
        request: Submit3dsAuthorizationV2Request,
    ) -> Result<Submit3dsAuthorizationResponse, Error> {
        self.call("Submit3DSAuthorizationV2", &request).await
    }

    #[instrument(skip_all)]
    async fn get_3ds_certs_config(&self) -> Result<ThreeDsCertsConfig, Error> {
        let url = self
            .certs_config_url
            .clone()
            .ok_or_else(|| Error::Custom("certificate configuration url not set".to_string()))?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}
