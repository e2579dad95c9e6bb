//! Tinkoff Pay process: Init, deeplink resolution, hand-off to the bank
//! application and status polling after the customer returns.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use crate::client::{AcquiringApi, InitRequest};
use crate::models::PaymentOptions;
use crate::poller::StatusPoller;
use crate::process::{PaymentState, ProcessCore};
use crate::Error;

/// Pays an order by redirecting the customer to the bank application.
pub struct TpayProcess {
    api: Arc<dyn AcquiringApi>,
    poller: StatusPoller,
    core: ProcessCore,
}

impl TpayProcess {
    /// Process bound to the given API.
    pub fn new(api: Arc<dyn AcquiringApi>) -> Self {
        Self {
            api,
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

    /// Open a session and resolve the bank-app deeplink.
    ///
    /// `version` is the Tinkoff Pay integration version the terminal
    /// reported via GetTerminalPayMethods.
    #[instrument(skip_all, fields(order_id = %options.order.order_id))]
    pub async fn start(&self, options: PaymentOptions, version: String) {
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

        let link = match self
            .core
            .cancellable(self.api.get_tinkoff_pay_link(payment_id, &version))
            .await
        {
            None => return,
            Some(Ok(link)) => link,
            Some(Err(error)) => {
                self.fail(Some(payment_id), error);
                return;
            }
        };
        self.core.set(PaymentState::NeedChooseOnUi {
            payment_id,
            deeplink: link.params.redirect_url,
        });
    }

    /// The host launched the deeplink; idempotent outside
    /// [`PaymentState::NeedChooseOnUi`].
    pub fn going_to_bank_app(&self) {
        if let PaymentState::NeedChooseOnUi { payment_id, .. } = self.core.current() {
            self.core.set(PaymentState::LeaveOnBankApp { payment_id });
        }
    }

    /// Poll the session status after the customer returns from the bank
    /// application.
    #[instrument(skip_all)]
    pub async fn start_checking_status(&self) {
        match self.core.current() {
            PaymentState::LeaveOnBankApp { payment_id } => {
                self.core
                    .run_status_polling(&self.api, &self.poller, payment_id, None, None)
                    .await;
            }
            PaymentState::CheckingStatus { .. } => {
                tracing::warn!("status polling already running");
            }
            other => {
                tracing::warn!("cannot check status from state {}", other.label());
            }
        }
    }

    fn fail(&self, payment_id: Option<crate::models::PaymentId>, error: Error) {
        self.core.set(PaymentState::PaymentFailed {
            payment_id,
            error: Arc::new(error),
        });
    }
}
