//! Request token signing.
//!
//! Every mutating API call carries a `Token` field: request parameters are
//! sorted lexicographically by key, the terminal password is injected under
//! the `Password` key, the values are concatenated and hashed. The exact
//! algorithm is a terminal-contract detail, so it sits behind a strategy
//! trait; [`PasswordTokenSigner`] implements the SHA-256 scheme the API
//! documents.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Strategy turning flat request parameters into a signature string.
pub trait TokenSigner: Send + Sync {
    /// Produce the signature for the given parameters.
    ///
    /// `params` holds only the scalar, top-level request fields; nested
    /// objects are excluded from signing by the caller.
    fn sign(&self, params: &BTreeMap<String, String>) -> String;
}

/// Default signer: inject the terminal password, concatenate values in key
/// order, hash with SHA-256, emit lowercase hex.
pub struct PasswordTokenSigner {
    password: String,
}

impl PasswordTokenSigner {
    /// Create a signer for the given terminal password.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl TokenSigner for PasswordTokenSigner {
    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let mut signable = params.clone();
        signable.insert("Password".to_string(), self.password.clone());

        let mut hasher = Sha256::new();
        for value in signable.values() {
            hasher.update(value.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut hex, byte| {
                use std::fmt::Write;
                let _ = write!(hex, "{byte:02x}");
                hex
            })
    }
}
