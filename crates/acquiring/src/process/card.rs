//! Card payment process: Init, 3-D Secure version check, FinishAuthorize
//! and an optional challenge round-trip.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use crate::client::{
    AcquiringApi, Check3dsVersionRequest, FinishAuthorizeRequest, InitRequest,
};
use crate::env::SdkEnvironment;
use crate::models::{CardSource, PaymentOptions};
use crate::poller::StatusPoller;
use crate::process::{PaymentState, ProcessCore};
use crate::threeds::{is_app_based_version, ThreeDsCoordinator, ThreeDsData, ThreeDsStatus};
use crate::Error;

/// Transaction statuses the ACS reports for a passed challenge.
const PASSED_TRANS_STATUSES: [&str; 2] = ["Y", "A"];

/// Pays an order with a full card number or an attached card.
pub struct CardPayProcess {
    api: Arc<dyn AcquiringApi>,
    env: Arc<SdkEnvironment>,
    threeds: ThreeDsCoordinator,
    poller: StatusPoller,
    core: ProcessCore,
}

impl CardPayProcess {
    /// Process bound to the given API and environment.
    pub fn new(api: Arc<dyn AcquiringApi>, env: Arc<SdkEnvironment>) -> Self {
        Self {
            threeds: ThreeDsCoordinator::new(api.clone(), env.clone()),
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

    /// Run one payment attempt.
    #[instrument(skip_all, fields(order_id = %options.order.order_id))]
    pub async fn start(&self, options: PaymentOptions, card: CardSource, email: Option<String>) {
        if !self.core.can_start() {
            tracing::warn!("start ignored in state {}", self.core.current().label());
            return;
        }
        self.core.set(PaymentState::Created);

        let card_data = match card.encode(self.env.encryptor.as_ref()) {
            Ok(card_data) => card_data,
            Err(error) => {
                self.fail(None, error);
                return;
            }
        };

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

        let check = match self
            .core
            .cancellable(self.api.check_3ds_version(Check3dsVersionRequest {
                payment_id,
                card_data: card_data.clone(),
            }))
            .await
        {
            None => return,
            Some(Ok(check)) => check,
            Some(Err(error)) => {
                self.fail(Some(payment_id), error);
                return;
            }
        };

        let mut finish_request = FinishAuthorizeRequest {
            payment_id,
            card_data,
            email,
            data: None,
        };
        if is_app_based_version(&check.version) {
            // Warm the certificate cache before the app-based challenge.
            if self
                .core
                .cancellable(self.threeds.certs_config())
                .await
                .is_none()
            {
                return;
            }
            finish_request.data = Some(self.threeds.collect_device_data());
        }

        let finish = match self
            .core
            .cancellable(self.api.finish_authorize(finish_request))
            .await
        {
            None => return,
            Some(Ok(finish)) => finish,
            Some(Err(error)) => {
                self.fail(Some(payment_id), error);
                return;
            }
        };

        if let Some(challenge) = self.threeds.challenge_state(&check, &finish) {
            self.core.set(PaymentState::ThreeDsUiNeeded { challenge });
            return;
        }
        if finish.status.is_success_terminal() {
            self.core.set(PaymentState::Success {
                payment_id,
                card_id: finish.card_id,
                rebill_id: finish.rebill_id,
            });
            return;
        }
        self.core
            .run_status_polling(&self.api, &self.poller, payment_id, finish.card_id, finish.rebill_id)
            .await;
    }

    /// Resume the process with a challenge outcome posted by the host UI.
    #[instrument(skip_all)]
    pub async fn submit_3ds_result(&self, result: ThreeDsStatus) {
        match result {
            ThreeDsStatus::Success { data, trans_status } => {
                if !PASSED_TRANS_STATUSES.contains(&trans_status.as_str()) {
                    self.fail(
                        Some(data.payment_id),
                        Error::ThreeDsRejected {
                            payment_id: data.payment_id,
                            trans_status,
                        },
                    );
                    return;
                }
                self.core
                    .run_status_polling(&self.api, &self.poller, data.payment_id, None, None)
                    .await;
            }
            ThreeDsStatus::Canceled => {
                tracing::info!("3-D Secure challenge canceled by the customer");
                self.core.set(PaymentState::Stopped);
            }
            ThreeDsStatus::Error(error) => {
                let payment_id = match self.core.current() {
                    PaymentState::ThreeDsUiNeeded { challenge } => {
                        Some(challenge.data.payment_id)
                    }
                    _ => None,
                };
                self.core.set(PaymentState::PaymentFailed { payment_id, error });
            }
        }
    }

    /// Post a browser- or app-flow challenge result to the API and resume
    /// with status polling.
    #[instrument(skip_all, fields(payment_id = %data.payment_id))]
    pub async fn submit_3ds_authorization(&self, data: &ThreeDsData, pa_res: Option<String>) {
        match self
            .core
            .cancellable(self.threeds.submit_authorization(data, pa_res))
            .await
        {
            None => {}
            Some(Ok(_)) => {
                self.core
                    .run_status_polling(&self.api, &self.poller, data.payment_id, None, None)
                    .await;
            }
            Some(Err(error)) => self.fail(Some(data.payment_id), error),
        }
    }

    fn fail(&self, payment_id: Option<crate::models::PaymentId>, error: Error) {
        self.core.set(PaymentState::PaymentFailed {
            payment_id,
            error: Arc::new(error),
        });
    }
}
