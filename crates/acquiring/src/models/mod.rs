//! Domain models shared across the client and the payment processes.

use std::fmt;

use serde::{Deserialize, Serialize};

mod card;
mod options;
mod status;

pub use card::{Card, CardEncryptor, CardSource, CardStatus};
pub use options::{CheckType, CustomerOptions, FeaturesOptions, OrderOptions, PaymentOptions};
pub use status::{AttachStatus, ResponseStatus};

/// Server-assigned payment session identifier.
///
/// Created by Init and referenced by every subsequent call of the same
/// payment attempt. Some endpoints return it as a JSON number and others as
/// a decimal string, so deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PaymentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for PaymentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(Self(id)),
            Raw::Text(text) => text
                .parse::<u64>()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid payment id: {text}"))),
        }
    }
}

/// Payment amount in minor currency units (kopecks).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
