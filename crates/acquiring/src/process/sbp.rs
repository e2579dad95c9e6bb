//! SBP process: Init, QR payload resolution and status polling once the
//! customer picked a participant bank.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use crate::client::{AcquiringApi, GetQrRequest, InitRequest};
use crate::models::PaymentOptions;
use crate::poller::StatusPoller;
use crate::process::{PaymentState, ProcessCore};
use crate::Error;

/// Pays an order over the Faster Payments System.
///
/// The QR payload doubles as a deeplink: the host either renders it as a
/// code or opens it directly so the customer can pick a participant bank.
pub struct SbpProcess {
    api: Arc<dyn AcquiringApi>,
    poller: StatusPoller,
    core: ProcessCore,
}

impl SbpProcess {
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

    /// Open a session and resolve the SBP payload.
    #[instrument(skip_all, fields(order_id = %options.order.order_id))]
    pub async fn start(&self, options: PaymentOptions) {
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

        let qr = match self
            .core
            .cancellable(self.api.get_qr(GetQrRequest::payload(payment_id)))
            .await
        {
            None => return,
            Some(Ok(qr)) => qr,
            Some(Err(error)) => {
                self.fail(Some(payment_id), error);
                return;
            }
        };
        self.core.set(PaymentState::NeedChooseOnUi {
            payment_id,
            deeplink: qr.data,
        });
    }

    /// The host launched a participant bank app; idempotent outside
    /// [`PaymentState::NeedChooseOnUi`].
    pub fn going_to_bank_app(&self) {
        if let PaymentState::NeedChooseOnUi { payment_id, .. } = self.core.current() {
            self.core.set(PaymentState::LeaveOnBankApp { payment_id });
        }
    }

    /// Poll the session status.
    ///
    /// Unlike the app-redirect methods, SBP also allows polling straight
    /// from [`PaymentState::NeedChooseOnUi`]: a customer scanning the
    /// rendered code never "leaves" for a bank application.
    #[instrument(skip_all)]
    pub async fn start_checking_status(&self) {
        match self.core.current() {
            PaymentState::LeaveOnBankApp { payment_id }
            | PaymentState::NeedChooseOnUi { payment_id, .. } => {
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
