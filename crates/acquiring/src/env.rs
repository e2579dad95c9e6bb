//! Process-wide SDK environment.
//!
//! Everything that outlives a single payment attempt lives here and is
//! passed to constructors explicitly: the host's card encryptor and device
//! data source, the per-installation UUID and the certificate cache. One
//! `SdkEnvironment` is built at application start and shared by every
//! process.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::CardEncryptor;
use crate::threeds::{CertsConfigCache, DeviceDataSource};

/// Shared, app-process-lifetime SDK state.
pub struct SdkEnvironment {
    /// Host-provided card payload encryptor
    pub encryptor: Arc<dyn CardEncryptor>,
    /// Host-provided device fingerprint source
    pub device_data: Arc<dyn DeviceDataSource>,
    installation_id: Uuid,
    /// Cached app-based 3-D Secure certificate configuration
    pub certs: CertsConfigCache,
}

impl SdkEnvironment {
    /// Environment with a freshly generated installation UUID.
    pub fn new(encryptor: Arc<dyn CardEncryptor>, device_data: Arc<dyn DeviceDataSource>) -> Self {
        Self {
            encryptor,
            device_data,
            installation_id: Uuid::new_v4(),
            certs: CertsConfigCache::default(),
        }
    }

    /// Reuse an installation UUID the host persisted earlier.
    pub fn with_installation_id(mut self, installation_id: Uuid) -> Self {
        self.installation_id = installation_id;
        self
    }

    /// Replace the default certificate cache, e.g. to shorten its refresh
    /// interval.
    pub fn with_certs_cache(mut self, certs: CertsConfigCache) -> Self {
        self.certs = certs;
        self
    }

    /// UUID identifying this installation across payments.
    pub fn installation_id(&self) -> Uuid {
        self.installation_id
    }
}
