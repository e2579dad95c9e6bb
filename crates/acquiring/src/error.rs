//! Error types for the acquiring SDK.

use crate::models::{PaymentId, ResponseStatus};

/// SDK error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or transport failure while talking to the acquiring API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body could not be parsed
    #[error("could not parse response: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid base or endpoint URL
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    /// Business-level error returned by the acquiring API
    #[error("acquiring api error {error_code}: {message}")]
    Api {
        /// Error code from the response envelope ("0" means success)
        error_code: String,
        /// Human-readable message from the bank
        message: String,
        /// Extended error details, when present
        details: Option<String>,
        /// Payment the error refers to, when the bank echoes it back
        payment_id: Option<PaymentId>,
    },
    /// The bank rejected the payment
    #[error("payment {payment_id} was rejected by the bank")]
    Rejected {
        /// Rejected payment session
        payment_id: PaymentId,
        /// Status observed when polling stopped
        status: ResponseStatus,
    },
    /// No terminal status was observed before the retry budget ran out,
    /// or the bank reported the payment deadline as expired
    #[error("timed out waiting for a terminal status of payment {payment_id}")]
    StatusTimeout {
        /// Payment session being polled
        payment_id: PaymentId,
        /// Last observed status; `None` when the retry budget was exhausted
        /// without the bank reporting a terminal state
        status: Option<ResponseStatus>,
    },
    /// Required payment option is missing or malformed
    #[error("invalid payment options: {0}")]
    InvalidOptions(String),
    /// Card source failed its own field validation
    #[error("invalid card source: {0}")]
    InvalidCardSource(String),
    /// Host-provided card encryptor failed
    #[error("card data encryption failed: {0}")]
    Encryption(String),
    /// The 3-D Secure challenge reported a failed transaction status
    #[error("3-D Secure challenge failed with transaction status {trans_status}")]
    ThreeDsRejected {
        /// Payment the challenge belonged to
        payment_id: PaymentId,
        /// Transaction status posted by the challenge surface
        trans_status: String,
    },
    /// The bank rejected a card-attach request
    #[error("card attach request {request_key} was rejected by the bank")]
    AttachRejected {
        /// Attach session the bank rejected
        request_key: String,
    },
    /// No terminal attach status before the retry budget ran out
    #[error("timed out waiting for a terminal status of attach request {request_key}")]
    AttachTimeout {
        /// Attach session being polled
        request_key: String,
    },
    /// Catch-all for host- or test-supplied failures
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Error code of an [`Error::Api`] variant, if this is one.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => Some(error_code),
            _ => None,
        }
    }

    /// Payment id carried by this error, when one is known.
    pub fn payment_id(&self) -> Option<PaymentId> {
        match self {
            Self::Api { payment_id, .. } => *payment_id,
            Self::Rejected { payment_id, .. }
            | Self::StatusTimeout { payment_id, .. }
            | Self::ThreeDsRejected { payment_id, .. } => Some(*payment_id),
            _ => None,
        }
    }
}
