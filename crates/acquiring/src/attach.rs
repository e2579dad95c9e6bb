//! Card attach flow: AddCard, AttachCard, an optional confirmation round
//! (3-D Secure or random amount) and GetAddCardState polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::client::{
    AcquiringApi, AddCardRequest, AttachCardRequest, GetAddCardStateRequest,
    SubmitRandomAmountRequest,
};
use crate::env::SdkEnvironment;
use crate::models::{Amount, AttachStatus, CardSource, CheckType};
use crate::poller::{DEFAULT_DELAY, DEFAULT_RETRIES_COUNT};
use crate::Error;

/// Current state of a card-attach process.
#[derive(Debug, Clone)]
pub enum AttachState {
    /// Process constructed or restarted, nothing sent yet
    Created,
    /// Attach session opened, request key assigned
    Started {
        /// Opened attach session
        request_key: String,
    },
    /// The bank demands a 3-D Secure check of the new card
    ThreeDsUiNeeded {
        /// Attach session being confirmed
        request_key: String,
        /// ACS challenge endpoint
        acs_url: String,
        /// Payment authentication request
        pa_req: Option<String>,
        /// Merchant data blob
        md: Option<String>,
    },
    /// The bank debited a random amount the customer must echo back
    LoopConfirmationUiNeeded {
        /// Attach session being confirmed
        request_key: String,
    },
    /// Attach status polling in progress
    CheckingStatus {
        /// Attach session being polled
        request_key: String,
        /// Last status observed, `None` before the first tick
        status: Option<AttachStatus>,
    },
    /// Terminal: card attached
    Success {
        /// Attached card
        card_id: String,
        /// Recurrence consent issued with the card, if any
        rebill_id: Option<String>,
    },
    /// Terminal for the attempt: attach failed; `start` may be called again
    Failed {
        /// Underlying failure
        error: Arc<Error>,
    },
    /// Terminal: process stopped, instance must be discarded
    Stopped,
}

impl AttachState {
    fn label(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Started { .. } => "Started",
            Self::ThreeDsUiNeeded { .. } => "ThreeDsUiNeeded",
            Self::LoopConfirmationUiNeeded { .. } => "LoopConfirmationUiNeeded",
            Self::CheckingStatus { .. } => "CheckingStatus",
            Self::Success { .. } => "Success",
            Self::Failed { .. } => "Failed",
            Self::Stopped => "Stopped",
        }
    }
}

/// Attaches a card to a customer.
pub struct AttachCardProcess {
    api: Arc<dyn AcquiringApi>,
    env: Arc<SdkEnvironment>,
    retries_count: u32,
    delay: Duration,
    state_tx: watch::Sender<AttachState>,
    cancel: CancellationToken,
    checking: AtomicBool,
}

impl AttachCardProcess {
    /// Process bound to the given API and environment.
    pub fn new(api: Arc<dyn AcquiringApi>, env: Arc<SdkEnvironment>) -> Self {
        let (state_tx, _) = watch::channel(AttachState::Created);
        Self {
            api,
            env,
            retries_count: DEFAULT_RETRIES_COUNT,
            delay: DEFAULT_DELAY,
            state_tx,
            cancel: CancellationToken::new(),
            checking: AtomicBool::new(false),
        }
    }

    /// Latest state.
    pub fn state(&self) -> AttachState {
        self.state_tx.borrow().clone()
    }

    /// Watch handle for observers.
    pub fn subscribe(&self) -> watch::Receiver<AttachState> {
        self.state_tx.subscribe()
    }

    /// Cancel in-flight work; the instance is unusable afterwards.
    pub fn stop(&self) {
        self.cancel.cancel();
        tracing::info!("attach process state -> Stopped");
        self.state_tx.send_replace(AttachState::Stopped);
    }

    fn set(&self, state: AttachState) {
        if self.cancel.is_cancelled() && !matches!(state, AttachState::Stopped) {
            return;
        }
        tracing::info!("attach process state -> {}", state.label());
        self.state_tx.send_replace(state);
    }

    fn fail(&self, error: Error) {
        self.set(AttachState::Failed {
            error: Arc::new(error),
        });
    }

    async fn cancellable<T>(&self, fut: impl std::future::Future<Output = T>) -> Option<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            value = fut => Some(value),
        }
    }

    /// Run one attach attempt.
    #[instrument(skip_all)]
    pub async fn start(&self, customer_key: String, check_type: CheckType, card: CardSource) {
        if matches!(
            self.state(),
            AttachState::Started { .. } | AttachState::CheckingStatus { .. } | AttachState::Stopped
        ) {
            tracing::warn!("start ignored in state {}", self.state().label());
            return;
        }
        self.set(AttachState::Created);

        let card_data = match card.encode(self.env.encryptor.as_ref()) {
            Ok(card_data) => card_data,
            Err(error) => {
                self.fail(error);
                return;
            }
        };

        let added = match self
            .cancellable(self.api.add_card(AddCardRequest {
                customer_key,
                check_type,
            }))
            .await
        {
            None => return,
            Some(Ok(added)) => added,
            Some(Err(error)) => {
                self.fail(error);
                return;
            }
        };
        let request_key = added.request_key;
        self.set(AttachState::Started {
            request_key: request_key.clone(),
        });

        let attached = match self
            .cancellable(self.api.attach_card(AttachCardRequest {
                request_key: request_key.clone(),
                card_data,
                data: None,
            }))
            .await
        {
            None => return,
            Some(Ok(attached)) => attached,
            Some(Err(error)) => {
                self.fail(error);
                return;
            }
        };

        if let Some(acs_url) = attached.acs_url {
            self.set(AttachState::ThreeDsUiNeeded {
                request_key,
                acs_url,
                pa_req: attached.pa_req,
                md: attached.md,
            });
            return;
        }
        match attached.status {
            Some(AttachStatus::LoopChecking) => {
                self.set(AttachState::LoopConfirmationUiNeeded { request_key });
            }
            Some(AttachStatus::Completed) => {
                self.set(AttachState::Success {
                    card_id: attached.card_id.unwrap_or_default(),
                    rebill_id: None,
                });
            }
            _ => self.check_attach_status(request_key).await,
        }
    }

    /// Confirm the attach with the random amount the bank debited.
    #[instrument(skip_all)]
    pub async fn submit_random_amount(&self, amount: Amount) {
        let AttachState::LoopConfirmationUiNeeded { request_key } = self.state() else {
            tracing::warn!("no random-amount confirmation pending");
            return;
        };
        match self
            .cancellable(self.api.submit_random_amount(SubmitRandomAmountRequest {
                request_key: request_key.clone(),
                amount,
            }))
            .await
        {
            None => {}
            Some(Ok(_)) => self.check_attach_status(request_key).await,
            Some(Err(error)) => self.fail(error),
        }
    }

    /// The 3-D Secure check of the new card finished; poll for the outcome.
    #[instrument(skip_all)]
    pub async fn challenge_finished(&self) {
        let AttachState::ThreeDsUiNeeded { request_key, .. } = self.state() else {
            tracing::warn!("no attach challenge pending");
            return;
        };
        self.check_attach_status(request_key).await;
    }

    /// The customer backed out of the 3-D Secure check.
    pub fn challenge_canceled(&self) {
        tracing::info!("attach challenge canceled by the customer");
        self.stop();
    }

    /// Poll GetAddCardState until a terminal attach status.
    ///
    /// Same shape as the payment status poller, over the attach status
    /// space: COMPLETED ends in `Success`, REJECTED fails, anything else
    /// spends a retry.
    async fn check_attach_status(&self, request_key: String) {
        if self.checking.swap(true, Ordering::SeqCst) {
            tracing::warn!("attach status polling already running");
            return;
        }
        self.set(AttachState::CheckingStatus {
            request_key: request_key.clone(),
            status: None,
        });

        let mut attempt = 0u32;
        loop {
            if attempt >= self.retries_count {
                self.fail(Error::AttachTimeout { request_key });
                break;
            }
            if attempt > 0 {
                let slept = self.cancellable(tokio::time::sleep(self.delay)).await;
                if slept.is_none() {
                    break;
                }
            }

            let state = match self
                .cancellable(self.api.get_add_card_state(GetAddCardStateRequest {
                    request_key: request_key.clone(),
                }))
                .await
            {
                None => break,
                Some(Ok(state)) => state,
                Some(Err(error)) => {
                    tracing::debug!("attach status fetch failed, treating as no status: {error}");
                    attempt += 1;
                    continue;
                }
            };

            match state.status {
                AttachStatus::Completed => {
                    self.set(AttachState::Success {
                        card_id: state.card_id.unwrap_or_default(),
                        rebill_id: state.rebill_id,
                    });
                    break;
                }
                AttachStatus::Rejected => {
                    self.fail(Error::AttachRejected { request_key });
                    break;
                }
                status => {
                    self.set(AttachState::CheckingStatus {
                        request_key: request_key.clone(),
                        status: Some(status),
                    });
                    attempt += 1;
                }
            }
        }
        self.checking.store(false, Ordering::SeqCst);
    }
}
