//! Payment-method processes.
//!
//! One process type per payment method, each a finite state machine over
//! [`PaymentState`]. A process owns a broadcast state channel (observers
//! read the latest state, last value wins) and a cancellation token wired
//! into every suspension point, so `stop()` (or the host dropping the
//! future it was driving) terminates in-flight network calls and polling
//! immediately. Transitions are strictly sequential per instance; the
//! public methods never return an error, failure is a state.
//!
//! # State flow
//!
//! ```text
//! Created ──> Started ──┬──> NeedChooseOnUi ──> LeaveOnBankApp ──┐
//!                       │                                        │
//!                       └──> ThreeDsUiNeeded ─┐                  │
//!                                             v                  v
//!                       CheckingStatus <──────┴──────────────────┘
//!                             │
//!                             ├──> Success
//!                             └──> PaymentFailed ──> (start again)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::{AcquiringApi, GetStateRequest};
use crate::models::{PaymentId, PaymentOptions, ResponseStatus};
use crate::poller::StatusPoller;
use crate::threeds::ThreeDsState;
use crate::Error;

mod card;
mod mirpay;
mod recurrent;
mod sbp;
mod tpay;

pub use card::CardPayProcess;
pub use mirpay::MirPayProcess;
pub use recurrent::{RecurrentPaymentProcess, CVC_REQUIRED_ERROR_CODE};
pub use sbp::SbpProcess;
pub use tpay::TpayProcess;

/// Current state of one payment-method process.
#[derive(Debug, Clone)]
pub enum PaymentState {
    /// Process constructed or restarted, nothing sent yet
    Created,
    /// Session opened, payment id assigned
    Started {
        /// Opened session
        payment_id: PaymentId,
    },
    /// A deeplink is ready; the host should offer it to the customer
    NeedChooseOnUi {
        /// Session the deeplink pays
        payment_id: PaymentId,
        /// Deeplink handing off to the external application
        deeplink: String,
    },
    /// The customer left for the external bank application
    LeaveOnBankApp {
        /// Session being paid externally
        payment_id: PaymentId,
    },
    /// Status polling in progress
    CheckingStatus {
        /// Session being polled
        payment_id: PaymentId,
        /// Last status observed, `None` before the first tick
        status: Option<ResponseStatus>,
    },
    /// A 3-D Secure challenge must be shown to the customer
    ThreeDsUiNeeded {
        /// Pending challenge
        challenge: ThreeDsState,
    },
    /// The bank demands CVC confirmation before charging the consent
    CvcUiNeeded {
        /// Options of the attempt to resume with `start_with_cvc`
        payment_options: PaymentOptions,
        /// Session the bank rejected pending confirmation
        rejected_payment_id: PaymentId,
    },
    /// Terminal: payment went through
    Success {
        /// Paid session
        payment_id: PaymentId,
        /// Card used, when the bank discloses it
        card_id: Option<String>,
        /// Recurrence consent registered by this payment, if any
        rebill_id: Option<String>,
    },
    /// Terminal for the attempt: payment failed; `start` may be called again
    PaymentFailed {
        /// Session that failed, when one was opened
        payment_id: Option<PaymentId>,
        /// Underlying failure
        error: Arc<Error>,
    },
    /// Terminal: process stopped, instance must be discarded
    Stopped,
}

impl PaymentState {
    /// Short label for transition logging.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Started { .. } => "Started",
            Self::NeedChooseOnUi { .. } => "NeedChooseOnUi",
            Self::LeaveOnBankApp { .. } => "LeaveOnBankApp",
            Self::CheckingStatus { .. } => "CheckingStatus",
            Self::ThreeDsUiNeeded { .. } => "ThreeDsUiNeeded",
            Self::CvcUiNeeded { .. } => "CvcUiNeeded",
            Self::Success { .. } => "Success",
            Self::PaymentFailed { .. } => "PaymentFailed",
            Self::Stopped => "Stopped",
        }
    }
}

/// State channel, cancellation token and polling guard shared by every
/// process type.
pub(crate) struct ProcessCore {
    state_tx: watch::Sender<PaymentState>,
    cancel: CancellationToken,
    checking: AtomicBool,
}

impl ProcessCore {
    pub(crate) fn new() -> Self {
        let (state_tx, _) = watch::channel(PaymentState::Created);
        Self {
            state_tx,
            cancel: CancellationToken::new(),
            checking: AtomicBool::new(false),
        }
    }

    /// Latest state of the process.
    pub(crate) fn current(&self) -> PaymentState {
        self.state_tx.borrow().clone()
    }

    /// Watch handle for observers; last value wins.
    pub(crate) fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.state_tx.subscribe()
    }

    /// Publish a transition. After `stop()` only `Stopped` sticks.
    pub(crate) fn set(&self, state: PaymentState) {
        if self.cancel.is_cancelled() && !matches!(state, PaymentState::Stopped) {
            return;
        }
        tracing::info!("payment process state -> {}", state.label());
        self.state_tx.send_replace(state);
    }

    /// Whether a fresh `start` is acceptable from the current state.
    ///
    /// Rejected while a start is being processed, while polling, while the
    /// customer is away in the bank application, and after `stop()`.
    pub(crate) fn can_start(&self) -> bool {
        !matches!(
            self.current(),
            PaymentState::Started { .. }
                | PaymentState::CheckingStatus { .. }
                | PaymentState::LeaveOnBankApp { .. }
                | PaymentState::Stopped
        )
    }

    /// Cancel in-flight work and park the process in `Stopped`.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
        tracing::info!("payment process state -> Stopped");
        self.state_tx.send_replace(PaymentState::Stopped);
    }

    /// Race a future against `stop()`; `None` means the process was
    /// stopped and the caller should return without touching state.
    pub(crate) async fn cancellable<T>(&self, fut: impl std::future::Future<Output = T>) -> Option<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            value = fut => Some(value),
        }
    }

    /// Drive the status poller for `payment_id`, publishing every observed
    /// status and finishing in `Success` or `PaymentFailed`.
    ///
    /// A second call while polling is already running is a logged no-op.
    pub(crate) async fn run_status_polling(
        &self,
        api: &Arc<dyn AcquiringApi>,
        poller: &StatusPoller,
        payment_id: PaymentId,
        card_id: Option<String>,
        rebill_id: Option<String>,
    ) {
        if self.checking.swap(true, Ordering::SeqCst) {
            tracing::warn!("status polling already running for payment {payment_id}");
            return;
        }
        self.set(PaymentState::CheckingStatus {
            payment_id,
            status: None,
        });

        let get_status = {
            let api = api.clone();
            move |payment_id: PaymentId| {
                let api = api.clone();
                async move {
                    let response = api.get_state(GetStateRequest { payment_id }).await?;
                    Ok(Some(response.status))
                }
            }
        };
        let stream = poller.poll(payment_id, get_status);
        futures::pin_mut!(stream);

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = stream.next() => next,
            };
            match next {
                Some(Ok(status)) if status.is_success_terminal() => {
                    self.set(PaymentState::Success {
                        payment_id,
                        card_id: card_id.clone(),
                        rebill_id: rebill_id.clone(),
                    });
                    break;
                }
                Some(Ok(status)) => {
                    self.set(PaymentState::CheckingStatus {
                        payment_id,
                        status: Some(status),
                    });
                }
                Some(Err(error)) => {
                    self.set(PaymentState::PaymentFailed {
                        payment_id: Some(payment_id),
                        error: Arc::new(error),
                    });
                    break;
                }
                None => break,
            }
        }
        self.checking.store(false, Ordering::SeqCst);
    }
}
