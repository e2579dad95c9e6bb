//! Payment lifecycle status as reported by the acquiring API.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::Deserialize;

/// Payment lifecycle status returned by the server.
///
/// Statuses fall into three disjoint sets: success-terminal
/// ([`Confirmed`](Self::Confirmed), [`Authorized`](Self::Authorized)),
/// failure-terminal ([`Rejected`](Self::Rejected),
/// [`DeadlineExpired`](Self::DeadlineExpired)) and non-terminal (everything
/// else). Unrecognized wire strings deserialize to
/// [`Unknown`](Self::Unknown) instead of failing, so a server rollout of a
/// new status never breaks an installed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    /// Session created, nothing charged yet
    New,
    /// Payment form shown to the customer
    FormShowed,
    /// Authorization in progress
    Authorizing,
    /// 3-D Secure verification in progress
    ThreeDsChecking,
    /// 3-D Secure verification finished
    ThreeDsChecked,
    /// Funds authorized (hold placed)
    Authorized,
    /// Confirmation in progress
    Confirming,
    /// Payment confirmed, funds captured
    Confirmed,
    /// Reversal in progress
    Reversing,
    /// Authorization reversed
    Reversed,
    /// Refund in progress
    Refunding,
    /// Fully refunded
    Refunded,
    /// Partially refunded
    PartialRefunded,
    /// The bank rejected the payment
    Rejected,
    /// The session deadline passed before a terminal state was reached
    DeadlineExpired,
    /// Canceled by the merchant
    Canceled,
    /// Pre-authorization in progress
    Preauthorizing,
    /// Random-amount confirmation loop in progress
    LoopChecking,
    /// Attempt budget on the bank side is spent
    AttemptsExpired,
    /// Any status string this SDK version does not recognize
    Unknown,
}

impl ResponseStatus {
    /// Wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::FormShowed => "FORM_SHOWED",
            Self::Authorizing => "AUTHORIZING",
            Self::ThreeDsChecking => "3DS_CHECKING",
            Self::ThreeDsChecked => "3DS_CHECKED",
            Self::Authorized => "AUTHORIZED",
            Self::Confirming => "CONFIRMING",
            Self::Confirmed => "CONFIRMED",
            Self::Reversing => "REVERSING",
            Self::Reversed => "REVERSED",
            Self::Refunding => "REFUNDING",
            Self::Refunded => "REFUNDED",
            Self::PartialRefunded => "PARTIAL_REFUNDED",
            Self::Rejected => "REJECTED",
            Self::DeadlineExpired => "DEADLINE_EXPIRED",
            Self::Canceled => "CANCELED",
            Self::Preauthorizing => "PREAUTHORIZING",
            Self::LoopChecking => "LOOP_CHECKING",
            Self::AttemptsExpired => "ATTEMPTS_EXPIRED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// True for statuses that end polling as a successful payment.
    pub fn is_success_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Authorized)
    }

    /// True for statuses that end polling as a failed payment.
    pub fn is_failure_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::DeadlineExpired)
    }

    /// True when polling should stop on this status.
    pub fn is_terminal(&self) -> bool {
        self.is_success_terminal() || self.is_failure_terminal()
    }
}

impl From<&str> for ResponseStatus {
    fn from(value: &str) -> Self {
        match value {
            "NEW" => Self::New,
            "FORM_SHOWED" => Self::FormShowed,
            "AUTHORIZING" => Self::Authorizing,
            "3DS_CHECKING" => Self::ThreeDsChecking,
            "3DS_CHECKED" => Self::ThreeDsChecked,
            "AUTHORIZED" => Self::Authorized,
            "CONFIRMING" => Self::Confirming,
            "CONFIRMED" => Self::Confirmed,
            "REVERSING" => Self::Reversing,
            "REVERSED" => Self::Reversed,
            "REFUNDING" => Self::Refunding,
            "REFUNDED" => Self::Refunded,
            "PARTIAL_REFUNDED" => Self::PartialRefunded,
            "REJECTED" => Self::Rejected,
            "DEADLINE_EXPIRED" => Self::DeadlineExpired,
            "CANCELED" => Self::Canceled,
            "PREAUTHORIZING" => Self::Preauthorizing,
            "LOOP_CHECKING" => Self::LoopChecking,
            "ATTEMPTS_EXPIRED" => Self::AttemptsExpired,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for ResponseStatus {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ResponseStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

/// Status of a card-attach request, as reported by GetAddCardState.
///
/// Follows the same forward-compatibility rule as [`ResponseStatus`]:
/// unrecognized strings become [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachStatus {
    /// Attach request accepted, confirmation still pending
    Processing,
    /// 3-D Secure verification of the new card in progress
    ThreeDsChecking,
    /// Random-amount confirmation loop in progress
    LoopChecking,
    /// Card attached
    Completed,
    /// Attach rejected by the bank
    Rejected,
    /// Any status string this SDK version does not recognize
    Unknown,
}

impl AttachStatus {
    /// Wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::ThreeDsChecking => "3DS_CHECKING",
            Self::LoopChecking => "LOOP_CHECKING",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// True when polling the attach state should stop on this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl From<&str> for AttachStatus {
    fn from(value: &str) -> Self {
        match value {
            "PROCESSING" => Self::Processing,
            "3DS_CHECKING" => Self::ThreeDsChecking,
            "LOOP_CHECKING" => Self::LoopChecking,
            "COMPLETED" => Self::Completed,
            "REJECTED" => Self::Rejected,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for AttachStatus {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl fmt::Display for AttachStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for AttachStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for AttachStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_ds_statuses_round_trip_exactly() {
        assert_eq!(
            ResponseStatus::from("3DS_CHECKING"),
            ResponseStatus::ThreeDsChecking
        );
        assert_eq!(
            ResponseStatus::from("3DS_CHECKED"),
            ResponseStatus::ThreeDsChecked
        );
        assert_eq!(ResponseStatus::ThreeDsChecking.as_str(), "3DS_CHECKING");
        assert_eq!(ResponseStatus::ThreeDsChecked.as_str(), "3DS_CHECKED");
    }

    #[test]
    fn unrecognized_status_becomes_unknown() {
        let status: ResponseStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, ResponseStatus::Unknown);
    }

    #[test]
    fn known_statuses_survive_serde_round_trip() {
        for status in [
            ResponseStatus::New,
            ResponseStatus::ThreeDsChecking,
            ResponseStatus::ThreeDsChecked,
            ResponseStatus::Authorized,
            ResponseStatus::Confirmed,
            ResponseStatus::Rejected,
            ResponseStatus::DeadlineExpired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: ResponseStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn terminal_sets_are_disjoint() {
        let all = [
            ResponseStatus::New,
            ResponseStatus::FormShowed,
            ResponseStatus::Authorizing,
            ResponseStatus::ThreeDsChecking,
            ResponseStatus::ThreeDsChecked,
            ResponseStatus::Authorized,
            ResponseStatus::Confirming,
            ResponseStatus::Confirmed,
            ResponseStatus::Reversing,
            ResponseStatus::Reversed,
            ResponseStatus::Refunding,
            ResponseStatus::Refunded,
            ResponseStatus::PartialRefunded,
            ResponseStatus::Rejected,
            ResponseStatus::DeadlineExpired,
            ResponseStatus::Canceled,
            ResponseStatus::Preauthorizing,
            ResponseStatus::LoopChecking,
            ResponseStatus::AttemptsExpired,
            ResponseStatus::Unknown,
        ];
        for status in all {
            assert!(
                !(status.is_success_terminal() && status.is_failure_terminal()),
                "{status} classified as both terminal sets"
            );
        }
        assert!(!ResponseStatus::Unknown.is_terminal());
    }
}
