//! Saved cards and the card sources a payment can be charged against.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Lifecycle status of a saved card.
///
/// The wire protocol uses single-letter codes; anything else maps to
/// [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    /// Usable for payments
    #[serde(rename = "A")]
    Active,
    /// Temporarily disabled
    #[serde(rename = "I")]
    Inactive,
    /// Removed by the customer or the bank
    #[serde(rename = "D")]
    Deleted,
    /// Unrecognized status code
    #[serde(other)]
    Unknown,
}

/// Saved-card descriptor returned by the card list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Card {
    /// Bank-side card identifier
    pub card_id: String,
    /// Masked card number
    pub pan: String,
    /// Card status
    pub status: CardStatus,
    /// Recurrence consent token, when one exists for this card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebill_id: Option<String>,
    /// Expiry in MMYY form, when the bank discloses it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_date: Option<String>,
}

/// Encrypts plain card payloads before they leave the device.
///
/// The cryptographic primitive itself lives with the host platform; the SDK
/// only defines the seam and Base64-encodes whatever comes back.
pub trait CardEncryptor: Send + Sync {
    /// Encrypt a plain payload with the terminal public key.
    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, Error>;
}

/// One concrete way to reference the card being charged.
///
/// Exactly one encoding strategy is active per instance: a full card number,
/// a previously attached card, or a bare recurrence token.
#[derive(Debug, Clone, PartialEq)]
pub enum CardSource {
    /// Full card data entered by the customer
    CardData {
        /// Primary account number
        pan: String,
        /// Expiry in MMYY form
        exp_date: String,
        /// Security code
        cvc: String,
        /// Cardholder name, when collected
        card_holder: Option<String>,
    },
    /// Card previously attached to the customer
    AttachedCard {
        /// Bank-side card identifier
        card_id: String,
        /// Security code confirming the charge
        cvc: String,
    },
    /// Recurrence consent token; no cardholder interaction required
    RebillId(String),
}

impl CardSource {
    /// Validate the fields this variant requires.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::CardData {
                pan,
                exp_date,
                cvc,
                ..
            } => {
                if !is_valid_pan(pan) {
                    return Err(Error::InvalidCardSource("card number is invalid".into()));
                }
                if !is_valid_exp_date(exp_date) {
                    return Err(Error::InvalidCardSource(
                        "expiry date must be four digits in MMYY form".into(),
                    ));
                }
                if !is_valid_cvc(cvc) {
                    return Err(Error::InvalidCardSource("security code is invalid".into()));
                }
                Ok(())
            }
            Self::AttachedCard { card_id, cvc } => {
                if card_id.trim().is_empty() {
                    return Err(Error::InvalidCardSource("card id must not be empty".into()));
                }
                if !is_valid_cvc(cvc) {
                    return Err(Error::InvalidCardSource("security code is invalid".into()));
                }
                Ok(())
            }
            Self::RebillId(rebill_id) => {
                if rebill_id.trim().is_empty() {
                    return Err(Error::InvalidCardSource(
                        "rebill id must not be empty".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Serialize this source to the encrypted, Base64-encoded payload the
    /// Init/FinishAuthorize calls expect.
    pub fn encode(&self, encryptor: &dyn CardEncryptor) -> Result<String, Error> {
        self.validate()?;
        let plain = match self {
            Self::CardData {
                pan,
                exp_date,
                cvc,
                card_holder,
            } => {
                let mut payload = format!("PAN={pan};ExpDate={exp_date};CVV={cvc}");
                if let Some(holder) = card_holder {
                    payload.push_str(&format!(";CardHolder={holder}"));
                }
                payload
            }
            Self::AttachedCard { card_id, cvc } => format!("CardId={card_id};CVV={cvc}"),
            Self::RebillId(rebill_id) => format!("RebillId={rebill_id}"),
        };
        let cipher = encryptor.encrypt(plain.as_bytes())?;
        Ok(BASE64.encode(cipher))
    }
}

fn is_valid_pan(pan: &str) -> bool {
    let digits_only = pan.chars().all(|c| c.is_ascii_digit());
    (13..=28).contains(&pan.len()) && digits_only && luhn_checksum_passes(pan)
}

fn is_valid_exp_date(exp_date: &str) -> bool {
    if exp_date.len() != 4 || !exp_date.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(exp_date[..2].parse::<u8>(), Ok(month) if (1..=12).contains(&month))
}

fn is_valid_cvc(cvc: &str) -> bool {
    (3..=4).contains(&cvc.len()) && cvc.chars().all(|c| c.is_ascii_digit())
}

fn luhn_checksum_passes(pan: &str) -> bool {
    let sum: u32 = pan
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, digit)| {
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}
