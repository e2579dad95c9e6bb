//! Payment process engine for a bank acquiring API.
//!
//! The SDK core is a set of per-payment-method state machines: each process
//! opens a payment session against the acquiring API, optionally hands the
//! customer off to an external application or a 3-D Secure challenge via a
//! deeplink, and polls the session status until a terminal state. Hosts
//! observe the process state over a watch channel and render it with the
//! [`mapping`] helpers; the platform UI itself lives outside this crate.
//!
//! # Modules
//!
//! - [`client`] - typed HTTP client and the [`client::AcquiringApi`] trait
//! - [`models`] - payment options, statuses, cards
//! - [`poller`] - generic retry-with-delay status polling
//! - [`process`] - one process type per payment method
//! - [`threeds`] - 3-D Secure version decisions and challenge plumbing
//! - [`attach`] - card attach flow
//! - [`cache`] - card list cache
//! - [`mapping`] - process state to host-facing descriptors

pub mod attach;
pub mod cache;
pub mod client;
pub mod env;
mod error;
pub mod mapping;
pub mod models;
pub mod poller;
pub mod process;
pub mod threeds;

pub use env::SdkEnvironment;
pub use error::Error;
pub use process::PaymentState;
