//! The acquiring API surface as a trait.
//!
//! Payment processes talk to the backend exclusively through this trait, so
//! tests can substitute a scripted implementation for the HTTP client.

use async_trait::async_trait;

use super::requests::*;
use super::responses::*;
use crate::models::{Card, PaymentId};
use crate::Error;

/// One method per wire operation of the acquiring API.
#[async_trait]
pub trait AcquiringApi: Send + Sync {
    /// Open a payment session.
    async fn init(&self, request: InitRequest) -> Result<InitResponse, Error>;

    /// Ask which 3-D Secure version applies to a card.
    async fn check_3ds_version(
        &self,
        request: Check3dsVersionRequest,
    ) -> Result<Check3dsVersionResponse, Error>;

    /// Submit card data and complete the authorization.
    async fn finish_authorize(
        &self,
        request: FinishAuthorizeRequest,
    ) -> Result<FinishAuthorizeResponse, Error>;

    /// Execute a recurring payment against a stored consent.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, Error>;

    /// Fetch the current status of a payment session.
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse, Error>;

    /// List the cards saved for a customer.
    async fn get_card_list(&self, request: GetCardListRequest) -> Result<Vec<Card>, Error>;

    /// Detach a saved card.
    async fn remove_card(&self, request: RemoveCardRequest) -> Result<RemoveCardResponse, Error>;

    /// Open a card-attach session.
    async fn add_card(&self, request: AddCardRequest) -> Result<AddCardResponse, Error>;

    /// Submit the card being attached.
    async fn attach_card(&self, request: AttachCardRequest) -> Result<AttachCardResponse, Error>;

    /// Fetch the current status of a card-attach session.
    async fn get_add_card_state(
        &self,
        request: GetAddCardStateRequest,
    ) -> Result<GetAddCardStateResponse, Error>;

    /// Confirm a card attach via the debited random amount.
    async fn submit_random_amount(
        &self,
        request: SubmitRandomAmountRequest,
    ) -> Result<SubmitRandomAmountResponse, Error>;

    /// Request an SBP payload for a payment session.
    async fn get_qr(&self, request: GetQrRequest) -> Result<GetQrResponse, Error>;

    /// Request the terminal's reusable SBP payload.
    async fn get_static_qr(&self, request: GetStaticQrRequest) -> Result<GetQrResponse, Error>;

    /// Discover which pay methods the terminal is provisioned for.
    async fn get_terminal_pay_methods(&self) -> Result<GetTerminalPayMethodsResponse, Error>;

    /// Resolve the bank-app deeplink for a Tinkoff Pay payment.
    async fn get_tinkoff_pay_link(
        &self,
        payment_id: PaymentId,
        version: &str,
    ) -> Result<PayLinkResponse, Error>;

    /// Resolve the bank-app deeplink for a Mir Pay payment.
    async fn get_mir_pay_link(&self, payment_id: PaymentId) -> Result<PayLinkResponse, Error>;

    /// Post a browser-flow 3-D Secure challenge result.
    async fn submit_3ds_authorization(
        &self,
        request: Submit3dsAuthorizationRequest,
    ) -> Result<Submit3dsAuthorizationResponse, Error>;

    /// Post an app-based 3-D Secure challenge result.
    async fn submit_3ds_authorization_v2(
        &self,
        request: Submit3dsAuthorizationV2Request,
    ) -> Result<Submit3dsAuthorizationResponse, Error>;

    /// Download the app-based 3-D Secure certificate configuration.
    async fn get_3ds_certs_config(&self) -> Result<ThreeDsCertsConfig, Error>;
}
