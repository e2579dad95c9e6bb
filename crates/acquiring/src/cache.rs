//! Card list cache.
//!
//! A single in-memory slot guarded by an async mutex: at most one refresh
//! is in flight at a time, and callers that queued up behind an ongoing
//! refresh share its result instead of issuing duplicate network calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::instrument;

use crate::client::{AcquiringApi, GetCardListRequest, RemoveCardRequest};
use crate::models::Card;
use crate::Error;

/// Default time a fetched card list stays fresh.
pub const DEFAULT_CARD_LIST_TTL: Duration = Duration::from_secs(5 * 60);

struct Slot {
    cards: Vec<Card>,
    updated_at: Instant,
}

/// Cached card list for one customer.
pub struct CardListCache {
    api: Arc<dyn AcquiringApi>,
    customer_key: String,
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl CardListCache {
    /// Cache for the given customer with the default TTL.
    pub fn new(api: Arc<dyn AcquiringApi>, customer_key: impl Into<String>) -> Self {
        Self::with_ttl(api, customer_key, DEFAULT_CARD_LIST_TTL)
    }

    /// Cache with a custom freshness window.
    pub fn with_ttl(
        api: Arc<dyn AcquiringApi>,
        customer_key: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            api,
            customer_key: customer_key.into(),
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The customer's cards, from cache when fresh.
    ///
    /// `force` bypasses freshness, except when another caller finished a
    /// refresh while this one was waiting for the lock, in which case that
    /// just-fetched result is shared.
    #[instrument(skip(self))]
    pub async fn cards(&self, force: bool) -> Result<Vec<Card>, Error> {
        let requested_at = Instant::now();
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            let refreshed_while_waiting = cached.updated_at >= requested_at;
            let fresh = cached.updated_at.elapsed() < self.ttl;
            if refreshed_while_waiting || (fresh && !force) {
                return Ok(cached.cards.clone());
            }
        }

        tracing::debug!("refreshing card list for customer {}", self.customer_key);
        let cards = self
            .api
            .get_card_list(GetCardListRequest {
                customer_key: self.customer_key.clone(),
            })
            .await?;
        *slot = Some(Slot {
            cards: cards.clone(),
            updated_at: Instant::now(),
        });
        Ok(cards)
    }

    /// Drop the cached list, e.g. after a card was attached or removed.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// Detach a saved card and drop the cached list.
    #[instrument(skip(self))]
    pub async fn remove_card(&self, card_id: &str) -> Result<(), Error> {
        self.api
            .remove_card(RemoveCardRequest {
                customer_key: self.customer_key.clone(),
                card_id: card_id.to_string(),
            })
            .await?;
        self.invalidate().await;
        Ok(())
    }
}
