//! Process-wide cache of the app-based 3-D Secure certificate configuration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::client::{AcquiringApi, ThreeDsCertsConfig};

/// Default minimum interval between refresh attempts.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(240 * 60);

/// Cached directory-server certificate configuration.
///
/// Read by every payment concurrently; refreshed from the remote document
/// no more often than the configured interval. A failed refresh keeps the
/// last-known-good configuration; availability is favored over freshness.
pub struct CertsConfigCache {
    slot: RwLock<Slot>,
    refresh_interval: Duration,
}

struct Slot {
    config: Arc<ThreeDsCertsConfig>,
    fetched_at: Option<Instant>,
}

impl CertsConfigCache {
    /// Empty cache with the given refresh interval.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            slot: RwLock::new(Slot {
                config: Arc::new(ThreeDsCertsConfig::default()),
                fetched_at: None,
            }),
            refresh_interval,
        }
    }

    /// Current configuration; empty until the first successful refresh.
    pub fn current(&self) -> Arc<ThreeDsCertsConfig> {
        self.slot.read().config.clone()
    }

    /// Refresh from the remote document if the cached copy is stale.
    ///
    /// Errors are logged and swallowed; concurrent refreshes are
    /// last-writer-wins with an atomic swap of the cached object.
    pub async fn refresh_if_stale(&self, api: &dyn AcquiringApi) {
        let stale = {
            let slot = self.slot.read();
            match slot.fetched_at {
                None => true,
                Some(fetched_at) => fetched_at.elapsed() >= self.refresh_interval,
            }
        };
        if !stale {
            return;
        }

        match api.get_3ds_certs_config().await {
            Ok(config) => {
                let mut slot = self.slot.write();
                slot.config = Arc::new(config);
                slot.fetched_at = Some(Instant::now());
            }
            Err(error) => {
                tracing::warn!("certificate config refresh failed, keeping last known: {error}");
            }
        }
    }
}

impl Default for CertsConfigCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
