//! Test helpers: a scripted acquiring backend and environment builders.
//!
//! [`ScriptedApi`] implements [`AcquiringApi`] from per-operation response
//! queues. Tests push the exact responses (or errors) a scenario needs and
//! assert on the resulting process states; an operation popped from an
//! empty queue fails the call with a recognizable error. Every handled
//! call is appended to a log so tests can assert how often the backend was
//! hit.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use acquiring::client::{
    AcquiringApi, AddCardRequest, AddCardResponse, AttachCardRequest, AttachCardResponse,
    ChargeRequest, ChargeResponse, Check3dsVersionRequest, Check3dsVersionResponse,
    FinishAuthorizeRequest, FinishAuthorizeResponse, GetAddCardStateRequest,
    GetAddCardStateResponse, GetCardListRequest, GetQrRequest, GetQrResponse, GetStateRequest,
    GetStateResponse, GetStaticQrRequest, GetTerminalPayMethodsResponse, InitRequest,
    InitResponse, PayLinkParams, PayLinkResponse, RemoveCardRequest, RemoveCardResponse,
    Submit3dsAuthorizationRequest, Submit3dsAuthorizationResponse, Submit3dsAuthorizationV2Request,
    SubmitRandomAmountRequest, SubmitRandomAmountResponse, ThreeDsCertsConfig,
};
use acquiring::models::{
    Card, CardEncryptor, FeaturesOptions, OrderOptions, PaymentId, PaymentOptions, ResponseStatus,
};
use acquiring::threeds::DeviceDataSource;
use acquiring::{Error, SdkEnvironment};
use async_trait::async_trait;

/// Initialize tracing once for a test binary.
pub fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

type Queue<T> = Mutex<VecDeque<Result<T, Error>>>;

fn pop<T>(queue: &Queue<T>, operation: &'static str) -> Result<T, Error> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(Error::Custom(format!("unscripted {operation} call"))))
}

/// Scripted [`AcquiringApi`] implementation.
#[derive(Default)]
pub struct ScriptedApi {
    init: Queue<InitResponse>,
    check_3ds_version: Queue<Check3dsVersionResponse>,
    finish_authorize: Queue<FinishAuthorizeResponse>,
    charge: Queue<ChargeResponse>,
    get_state: Queue<GetStateResponse>,
    get_card_list: Queue<Vec<Card>>,
    remove_card: Queue<RemoveCardResponse>,
    tinkoff_pay_link: Queue<PayLinkResponse>,
    mir_pay_link: Queue<PayLinkResponse>,
    get_qr: Queue<GetQrResponse>,
    add_card: Queue<AddCardResponse>,
    attach_card: Queue<AttachCardResponse>,
    get_add_card_state: Queue<GetAddCardStateResponse>,
    submit_random_amount: Queue<SubmitRandomAmountResponse>,
    submit_3ds: Queue<Submit3dsAuthorizationResponse>,
    certs_config: Queue<ThreeDsCertsConfig>,
    /// Last FinishAuthorize request, for asserting on device data
    pub last_finish_authorize: Mutex<Option<FinishAuthorizeRequest>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedApi {
    /// Empty backend; every call is unscripted until pushed.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }

    /// How many times `operation` was called.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| **name == operation)
            .count()
    }

    /// Queue an Init outcome.
    pub fn push_init(&self, response: Result<InitResponse, Error>) {
        self.init.lock().unwrap().push_back(response);
    }

    /// Queue a Check3dsVersion outcome.
    pub fn push_check_3ds_version(&self, response: Result<Check3dsVersionResponse, Error>) {
        self.check_3ds_version.lock().unwrap().push_back(response);
    }

    /// Queue a FinishAuthorize outcome.
    pub fn push_finish_authorize(&self, response: Result<FinishAuthorizeResponse, Error>) {
        self.finish_authorize.lock().unwrap().push_back(response);
    }

    /// Queue a Charge outcome.
    pub fn push_charge(&self, response: Result<ChargeResponse, Error>) {
        self.charge.lock().unwrap().push_back(response);
    }

    /// Queue a GetState outcome.
    pub fn push_get_state(&self, response: Result<GetStateResponse, Error>) {
        self.get_state.lock().unwrap().push_back(response);
    }

    /// Queue a plain GetState status.
    pub fn push_status(&self, payment_id: u64, status: ResponseStatus) {
        self.push_get_state(Ok(GetStateResponse {
            payment_id: PaymentId(payment_id),
            status,
            amount: None,
            order_id: None,
        }));
    }

    /// Queue a GetCardList outcome.
    pub fn push_card_list(&self, response: Result<Vec<Card>, Error>) {
        self.get_card_list.lock().unwrap().push_back(response);
    }

    /// Queue a RemoveCard outcome.
    pub fn push_remove_card(&self, response: Result<RemoveCardResponse, Error>) {
        self.remove_card.lock().unwrap().push_back(response);
    }

    /// Queue a Tinkoff Pay link outcome.
    pub fn push_tinkoff_pay_link(&self, response: Result<PayLinkResponse, Error>) {
        self.tinkoff_pay_link.lock().unwrap().push_back(response);
    }

    /// Queue a Mir Pay link outcome.
    pub fn push_mir_pay_link(&self, response: Result<PayLinkResponse, Error>) {
        self.mir_pay_link.lock().unwrap().push_back(response);
    }

    /// Queue a GetQr outcome.
    pub fn push_get_qr(&self, response: Result<GetQrResponse, Error>) {
        self.get_qr.lock().unwrap().push_back(response);
    }

    /// Queue an AddCard outcome.
    pub fn push_add_card(&self, response: Result<AddCardResponse, Error>) {
        self.add_card.lock().unwrap().push_back(response);
    }

    /// Queue an AttachCard outcome.
    pub fn push_attach_card(&self, response: Result<AttachCardResponse, Error>) {
        self.attach_card.lock().unwrap().push_back(response);
    }

    /// Queue a GetAddCardState outcome.
    pub fn push_get_add_card_state(&self, response: Result<GetAddCardStateResponse, Error>) {
        self.get_add_card_state.lock().unwrap().push_back(response);
    }

    /// Queue a SubmitRandomAmount outcome.
    pub fn push_submit_random_amount(&self, response: Result<SubmitRandomAmountResponse, Error>) {
        self.submit_random_amount.lock().unwrap().push_back(response);
    }

    /// Queue a Submit3DSAuthorization outcome (either version).
    pub fn push_submit_3ds(&self, response: Result<Submit3dsAuthorizationResponse, Error>) {
        self.submit_3ds.lock().unwrap().push_back(response);
    }

    /// Queue a certificate configuration outcome.
    pub fn push_certs_config(&self, response: Result<ThreeDsCertsConfig, Error>) {
        self.certs_config.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl AcquiringApi for ScriptedApi {
    async fn init(&self, _request: InitRequest) -> Result<InitResponse, Error> {
        self.record("Init");
        tokio::task::yield_now().await;
        pop(&self.init, "Init")
    }

    async fn check_3ds_version(
        &self,
        _request: Check3dsVersionRequest,
    ) -> Result<Check3dsVersionResponse, Error> {
        self.record("Check3dsVersion");
        tokio::task::yield_now().await;
        pop(&self.check_3ds_version, "Check3dsVersion")
    }

    async fn finish_authorize(
        &self,
        request: FinishAuthorizeRequest,
    ) -> Result<FinishAuthorizeResponse, Error> {
        self.record("FinishAuthorize");
        *self.last_finish_authorize.lock().unwrap() = Some(request);
        tokio::task::yield_now().await;
        pop(&self.finish_authorize, "FinishAuthorize")
    }

    async fn charge(&self, _request: ChargeRequest) -> Result<ChargeResponse, Error> {
        self.record("Charge");
        tokio::task::yield_now().await;
        pop(&self.charge, "Charge")
    }

    async fn get_state(&self, _request: GetStateRequest) -> Result<GetStateResponse, Error> {
        self.record("GetState");
        tokio::task::yield_now().await;
        pop(&self.get_state, "GetState")
    }

    async fn get_card_list(&self, _request: GetCardListRequest) -> Result<Vec<Card>, Error> {
        self.record("GetCardList");
        tokio::task::yield_now().await;
        pop(&self.get_card_list, "GetCardList")
    }

    async fn remove_card(&self, _request: RemoveCardRequest) -> Result<RemoveCardResponse, Error> {
        self.record("RemoveCard");
        tokio::task::yield_now().await;
        pop(&self.remove_card, "RemoveCard")
    }

    async fn add_card(&self, _request: AddCardRequest) -> Result<AddCardResponse, Error> {
        self.record("AddCard");
        tokio::task::yield_now().await;
        pop(&self.add_card, "AddCard")
    }

    async fn attach_card(&self, _request: AttachCardRequest) -> Result<AttachCardResponse, Error> {
        self.record("AttachCard");
        tokio::task::yield_now().await;
        pop(&self.attach_card, "AttachCard")
    }

    async fn get_add_card_state(
        &self,
        _request: GetAddCardStateRequest,
    ) -> Result<GetAddCardStateResponse, Error> {
        self.record("GetAddCardState");
        tokio::task::yield_now().await;
        pop(&self.get_add_card_state, "GetAddCardState")
    }

    async fn submit_random_amount(
        &self,
        _request: SubmitRandomAmountRequest,
    ) -> Result<SubmitRandomAmountResponse, Error> {
        self.record("SubmitRandomAmount");
        tokio::task::yield_now().await;
        pop(&self.submit_random_amount, "SubmitRandomAmount")
    }

    async fn get_qr(&self, _request: GetQrRequest) -> Result<GetQrResponse, Error> {
        self.record("GetQr");
        tokio::task::yield_now().await;
        pop(&self.get_qr, "GetQr")
    }

    async fn get_static_qr(&self, _request: GetStaticQrRequest) -> Result<GetQrResponse, Error> {
        self.record("GetStaticQr");
        Err(Error::Custom("unscripted GetStaticQr call".to_string()))
    }

    async fn get_terminal_pay_methods(&self) -> Result<GetTerminalPayMethodsResponse, Error> {
        self.record("GetTerminalPayMethods");
        Err(Error::Custom(
            "unscripted GetTerminalPayMethods call".to_string(),
        ))
    }

    async fn get_tinkoff_pay_link(
        &self,
        _payment_id: PaymentId,
        _version: &str,
    ) -> Result<PayLinkResponse, Error> {
        self.record("TinkoffPayLink");
        tokio::task::yield_now().await;
        pop(&self.tinkoff_pay_link, "TinkoffPayLink")
    }

    async fn get_mir_pay_link(&self, _payment_id: PaymentId) -> Result<PayLinkResponse, Error> {
        self.record("MirPayLink");
        tokio::task::yield_now().await;
        pop(&self.mir_pay_link, "MirPayLink")
    }

    async fn submit_3ds_authorization(
        &self,
        _request: Submit3dsAuthorizationRequest,
    ) -> Result<Submit3dsAuthorizationResponse, Error> {
        self.record("Submit3DSAuthorization");
        tokio::task::yield_now().await;
        pop(&self.submit_3ds, "Submit3DSAuthorization")
    }

    async fn submit_3ds_authorization_v2(
        &self,
        _request: Submit3dsAuthorizationV2Request,
    ) -> Result<Submit3dsAuthorizationResponse, Error> {
        self.record("Submit3DSAuthorizationV2");
        tokio::task::yield_now().await;
        pop(&self.submit_3ds, "Submit3DSAuthorizationV2")
    }

    async fn get_3ds_certs_config(&self) -> Result<ThreeDsCertsConfig, Error> {
        self.record("CertsConfig");
        tokio::task::yield_now().await;
        pop(&self.certs_config, "CertsConfig")
    }
}

/// Echoes card payloads back unencrypted.
pub struct NoopEncryptor;

impl CardEncryptor for NoopEncryptor {
    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(plain.to_vec())
    }
}

/// Fixed device fingerprint for tests.
pub struct TestDeviceData;

impl DeviceDataSource for TestDeviceData {
    fn timezone_offset_minutes(&self) -> i32 {
        -180
    }

    fn screen_width(&self) -> u32 {
        1080
    }

    fn screen_height(&self) -> u32 {
        2400
    }

    fn language(&self) -> String {
        "ru-RU".to_string()
    }
}

/// Shared environment with the no-op encryptor and fixed device data.
pub fn test_env() -> Arc<SdkEnvironment> {
    Arc::new(SdkEnvironment::new(
        Arc::new(NoopEncryptor),
        Arc::new(TestDeviceData),
    ))
}

/// Minimal valid payment options.
pub fn payment_options(order_id: &str, amount: u64) -> PaymentOptions {
    PaymentOptions::new(
        OrderOptions {
            order_id: order_id.to_string(),
            amount: amount.into(),
            recurrent: false,
            description: None,
            receipt: None,
        },
        None,
        FeaturesOptions::default(),
    )
    .expect("test options are valid")
}

/// Init response opening session `payment_id` in the NEW status.
pub fn init_ok(payment_id: u64) -> InitResponse {
    InitResponse {
        payment_id: PaymentId(payment_id),
        status: ResponseStatus::New,
        amount: None,
        order_id: None,
        payment_url: None,
    }
}

/// Pay-link response redirecting to `url`.
pub fn pay_link(url: &str) -> PayLinkResponse {
    PayLinkResponse {
        params: PayLinkParams {
            redirect_url: url.to_string(),
        },
    }
}

/// FinishAuthorize response with the given status and no challenge.
pub fn finish_ok(payment_id: u64, status: ResponseStatus) -> FinishAuthorizeResponse {
    FinishAuthorizeResponse {
        payment_id: PaymentId(payment_id),
        status,
        amount: None,
        acs_url: None,
        pa_req: None,
        md: None,
        tds_server_trans_id: None,
        acs_trans_id: None,
        card_id: None,
        rebill_id: None,
    }
}

/// Charge response with the given status.
pub fn charge_ok(payment_id: u64, status: ResponseStatus) -> ChargeResponse {
    ChargeResponse {
        payment_id: PaymentId(payment_id),
        status,
        amount: None,
        order_id: None,
        card_id: None,
    }
}

/// Business error with the given code, as the client would surface it.
pub fn api_error(error_code: &str, payment_id: Option<u64>) -> Error {
    Error::Api {
        error_code: error_code.to_string(),
        message: "scripted decline".to_string(),
        details: None,
        payment_id: payment_id.map(PaymentId),
    }
}
