//! Mapping process states to host-facing descriptors, events and results.
//!
//! Three total functions over [`PaymentState`]. They deliberately match
//! every variant by name: adding a state without deciding its sheet, event
//! and result is a compile error, not a silent gap.

use std::sync::Arc;

use crate::models::PaymentId;
use crate::process::PaymentState;
use crate::threeds::ThreeDsState;
use crate::Error;

/// Semantic key of the status sheet the host should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// Spinner: the payment is being processed
    Processing,
    /// The customer should pick an application to continue in
    AppSelection,
    /// Waiting for the customer to come back from the bank application
    WaitingReturn,
    /// A 3-D Secure challenge is on screen
    ChallengeInProgress,
    /// The customer must enter the card security code
    CvcEntry,
    /// Payment went through
    Paid,
    /// The bank rejected the payment
    Rejected,
    /// No terminal status arrived in time
    TimedOut,
    /// Any other failure
    Failure,
    /// The flow was canceled
    Canceled,
}

/// Status sheet descriptor derived from a process state.
#[derive(Debug, Clone)]
pub struct StatusSheet {
    /// What the sheet should say
    pub kind: SheetKind,
    /// Underlying failure for diagnostics, when there is one
    pub error: Option<Arc<Error>>,
}

/// One-shot navigation the host should perform.
#[derive(Debug, Clone)]
pub enum NavEvent {
    /// Open the deeplink in the external application
    OpenDeeplink(String),
    /// Present the 3-D Secure challenge surface
    OpenChallenge(ThreeDsState),
    /// Ask the customer for the card security code
    RequestCvc {
        /// Charge the bank parked pending confirmation
        rejected_payment_id: PaymentId,
    },
}

/// Terminal result delivered to the caller that launched the flow.
#[derive(Debug, Clone)]
pub enum LauncherResult {
    /// Payment went through
    Success {
        /// Paid session
        payment_id: PaymentId,
        /// Card used, when disclosed
        card_id: Option<String>,
        /// Recurrence consent registered, if any
        rebill_id: Option<String>,
    },
    /// Payment failed
    Error {
        /// Underlying failure
        error: Arc<Error>,
        /// Session that failed, when one was opened
        payment_id: Option<PaymentId>,
        /// Bank error code, when the failure was a business error
        error_code: Option<String>,
    },
    /// The customer backed out
    Canceled,
}

/// Status sheet for the given state. Total.
pub fn status_sheet(state: &PaymentState) -> StatusSheet {
    let (kind, error) = match state {
        PaymentState::Created => (SheetKind::Processing, None),
        PaymentState::Started { .. } => (SheetKind::Processing, None),
        PaymentState::NeedChooseOnUi { .. } => (SheetKind::AppSelection, None),
        PaymentState::LeaveOnBankApp { .. } => (SheetKind::WaitingReturn, None),
        PaymentState::CheckingStatus { .. } => (SheetKind::Processing, None),
        PaymentState::ThreeDsUiNeeded { .. } => (SheetKind::ChallengeInProgress, None),
        PaymentState::CvcUiNeeded { .. } => (SheetKind::CvcEntry, None),
        PaymentState::Success { .. } => (SheetKind::Paid, None),
        PaymentState::PaymentFailed { error, .. } => {
            let kind = match error.as_ref() {
                Error::Rejected { .. } => SheetKind::Rejected,
                Error::StatusTimeout { .. } => SheetKind::TimedOut,
                _ => SheetKind::Failure,
            };
            (kind, Some(error.clone()))
        }
        PaymentState::Stopped => (SheetKind::Canceled, None),
    };
    StatusSheet { kind, error }
}

/// Navigation the host should perform on entering the given state, if any.
/// Total over the variant set; one-shot by contract: the host fires it
/// once per transition.
pub fn navigation_event(state: &PaymentState) -> Option<NavEvent> {
    match state {
        PaymentState::Created => None,
        PaymentState::Started { .. } => None,
        PaymentState::NeedChooseOnUi { deeplink, .. } => {
            Some(NavEvent::OpenDeeplink(deeplink.clone()))
        }
        PaymentState::LeaveOnBankApp { .. } => None,
        PaymentState::CheckingStatus { .. } => None,
        PaymentState::ThreeDsUiNeeded { challenge } => {
            Some(NavEvent::OpenChallenge(challenge.clone()))
        }
        PaymentState::CvcUiNeeded {
            rejected_payment_id,
            ..
        } => Some(NavEvent::RequestCvc {
            rejected_payment_id: *rejected_payment_id,
        }),
        PaymentState::Success { .. } => None,
        PaymentState::PaymentFailed { .. } => None,
        PaymentState::Stopped => None,
    }
}

/// Launcher result for the given state; `None` while the flow is still
/// running. Total over the variant set.
pub fn launcher_result(state: &PaymentState) -> Option<LauncherResult> {
    match state {
        PaymentState::Created => None,
        PaymentState::Started { .. } => None,
        PaymentState::NeedChooseOnUi { .. } => None,
        PaymentState::LeaveOnBankApp { .. } => None,
        PaymentState::CheckingStatus { .. } => None,
        PaymentState::ThreeDsUiNeeded { .. } => None,
        PaymentState::CvcUiNeeded { .. } => None,
        PaymentState::Success {
            payment_id,
            card_id,
            rebill_id,
        } => Some(LauncherResult::Success {
            payment_id: *payment_id,
            card_id: card_id.clone(),
            rebill_id: rebill_id.clone(),
        }),
        PaymentState::PaymentFailed { payment_id, error } => Some(LauncherResult::Error {
            error: error.clone(),
            payment_id: *payment_id,
            error_code: error.api_error_code().map(str::to_string),
        }),
        PaymentState::Stopped => Some(LauncherResult::Canceled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseStatus;

    #[test]
    fn rejected_and_timed_out_sheets_differ() {
        let rejected = PaymentState::PaymentFailed {
            payment_id: Some(PaymentId(1)),
            error: Arc::new(Error::Rejected {
                payment_id: PaymentId(1),
                status: ResponseStatus::Rejected,
            }),
        };
        let timed_out = PaymentState::PaymentFailed {
            payment_id: Some(PaymentId(1)),
            error: Arc::new(Error::StatusTimeout {
                payment_id: PaymentId(1),
                status: None,
            }),
        };
        assert_eq!(status_sheet(&rejected).kind, SheetKind::Rejected);
        assert_eq!(status_sheet(&timed_out).kind, SheetKind::TimedOut);
    }

    #[test]
    fn deeplink_state_produces_an_open_event() {
        let state = PaymentState::NeedChooseOnUi {
            payment_id: PaymentId(5),
            deeplink: "bank100000000004://pay".to_string(),
        };
        match navigation_event(&state) {
            Some(NavEvent::OpenDeeplink(link)) => assert_eq!(link, "bank100000000004://pay"),
            other => panic!("expected OpenDeeplink, got {other:?}"),
        }
    }

    #[test]
    fn stopped_maps_to_canceled_result() {
        assert!(matches!(
            launcher_result(&PaymentState::Stopped),
            Some(LauncherResult::Canceled)
        ));
        assert!(launcher_result(&PaymentState::Created).is_none());
    }

    #[test]
    fn business_error_code_is_surfaced() {
        let state = PaymentState::PaymentFailed {
            payment_id: Some(PaymentId(9)),
            error: Arc::new(Error::Api {
                error_code: "1030".to_string(),
                message: "insufficient funds".to_string(),
                details: None,
                payment_id: Some(PaymentId(9)),
            }),
        };
        match launcher_result(&state) {
            Some(LauncherResult::Error { error_code, .. }) => {
                assert_eq!(error_code.as_deref(), Some("1030"));
            }
            other => panic!("expected Error result, got {other:?}"),
        }
    }
}
