//! Recurring payment process: Init plus Charge against a stored consent,
//! with a CVC confirmation branch when the bank demands it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use crate::client::{AcquiringApi, ChargeRequest, FinishAuthorizeRequest, InitRequest};
use crate::env::SdkEnvironment;
use crate::models::{CardSource, PaymentId, PaymentOptions};
use crate::poller::StatusPoller;
use crate::process::{PaymentState, ProcessCore};
use crate::Error;

/// Error code the bank returns when a recurring charge needs the customer
/// to confirm with the card security code. A single documented special
/// case; no other codes trigger the confirmation branch.
pub const CVC_REQUIRED_ERROR_CODE: &str = "104";

/// Init `DATA` key referencing the charge the bank rejected pending
/// confirmation.
const FAILED_SESSION_DATA_KEY: &str = "failMapiSessionId";

/// Charges a stored recurrence consent without cardholder interaction.
pub struct RecurrentPaymentProcess {
    api: Arc<dyn AcquiringApi>,
    env: Arc<SdkEnvironment>,
    poller: StatusPoller,
    core: ProcessCore,
}

impl RecurrentPaymentProcess {
    /// Process bound to the given API and environment.
    pub fn new(api: Arc<dyn AcquiringApi>, env: Arc<SdkEnvironment>) -> Self {
        Self {
            api,
            env,
            poller: StatusPoller::default(),
            core: ProcessCore::new(),
        }
    }

    /// Replace the default status poller.
    pub fn with_poller(mut self, poller: StatusPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Latest state.
    pub fn state(&self) -> PaymentState {
        self.core.current()
    }

    /// Watch handle for observers.
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.core.subscribe()
    }

    /// Cancel in-flight work; the instance is unusable afterwards.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Run one charge attempt against the consent.
    #[instrument(skip_all, fields(order_id = %options.order.order_id))]
    pub async fn start(&self, options: PaymentOptions, rebill_id: String) {
        if !self.core.can_start() {
            tracing::warn!("start ignored in state {}", self.core.current().label());
            return;
        }
        self.core.set(PaymentState::Created);

        let init = match self
            .core
            .cancellable(self.api.init(InitRequest::from_options(&options)))
            .await
        {
            None => return,
            Some(Ok(init)) => init,
            Some(Err(error)) => {
                self.fail(None, error);
                return;
            }
        };
        let payment_id = init.payment_id;
        self.core.set(PaymentState::Started { payment_id });

        let charge = match self
            .core
            .cancellable(self.api.charge(ChargeRequest {
                payment_id,
                rebill_id: rebill_id.clone(),
            }))
            .await
        {
            None => return,
            Some(charge) => charge,
        };

        match charge {
            Ok(response) if response.status.is_success_terminal() => {
                self.core.set(PaymentState::Success {
                    payment_id,
                    card_id: response.card_id,
                    rebill_id: Some(rebill_id),
                });
            }
            Ok(response) => {
                self.core
                    .run_status_polling(
                        &self.api,
                        &self.poller,
                        payment_id,
                        response.card_id,
                        Some(rebill_id),
                    )
                    .await;
            }
            Err(error) if error.api_error_code() == Some(CVC_REQUIRED_ERROR_CODE) => {
                let rejected_payment_id = error.payment_id().unwrap_or(payment_id);
                tracing::info!(
                    "charge of payment {rejected_payment_id} needs CVC confirmation"
                );
                self.core.set(PaymentState::CvcUiNeeded {
                    payment_options: options,
                    rejected_payment_id,
                });
            }
            Err(error) => self.fail(Some(payment_id), error),
        }
    }

    /// Resume a charge the bank parked in [`PaymentState::CvcUiNeeded`].
    ///
    /// Opens a fresh session referencing the rejected one and confirms with
    /// the stored card, referenced by its rebill token, plus the CVC the
    /// customer just entered.
    #[instrument(skip_all, fields(rejected_payment_id = %rejected_payment_id))]
    pub async fn start_with_cvc(
        &self,
        cvc: String,
        rebill_id: String,
        rejected_payment_id: PaymentId,
        options: PaymentOptions,
    ) {
        if !self.core.can_start() {
            tracing::warn!(
                "start_with_cvc ignored in state {}",
                self.core.current().label()
            );
            return;
        }
        self.core.set(PaymentState::Created);

        let card_data = match (CardSource::AttachedCard {
            card_id: rebill_id,
            cvc,
        })
        .encode(self.env.encryptor.as_ref())
        {
            Ok(card_data) => card_data,
            Err(error) => {
                self.fail(None, error);
                return;
            }
        };

        let init_request = InitRequest::from_options(&options)
            .with_data(FAILED_SESSION_DATA_KEY, rejected_payment_id.to_string());
        let init = match self.core.cancellable(self.api.init(init_request)).await {
            None => return,
            Some(Ok(init)) => init,
            Some(Err(error)) => {
                self.fail(None, error);
                return;
            }
        };
        let payment_id = init.payment_id;
        self.core.set(PaymentState::Started { payment_id });

        let email = options
            .customer
            .as_ref()
            .and_then(|customer| customer.email.clone());
        let finish = match self
            .core
            .cancellable(self.api.finish_authorize(FinishAuthorizeRequest {
                payment_id,
                card_data,
                email,
                data: None,
            }))
            .await
        {
            None => return,
            Some(Ok(finish)) => finish,
            Some(Err(error)) => {
                self.fail(Some(payment_id), error);
                return;
            }
        };

        if finish.status.is_success_terminal() {
            self.core.set(PaymentState::Success {
                payment_id,
                card_id: finish.card_id,
                rebill_id: finish.rebill_id,
            });
            return;
        }
        self.core
            .run_status_polling(
                &self.api,
                &self.poller,
                payment_id,
                finish.card_id,
                finish.rebill_id,
            )
            .await;
    }

    fn fail(&self, payment_id: Option<PaymentId>, error: Error) {
        self.core.set(PaymentState::PaymentFailed {
            payment_id,
            error: Arc::new(error),
        });
    }
}
