//! Certificate configuration cache behavior.

use std::sync::Arc;
use std::time::Duration;

use acquiring::client::{DirectoryServerCert, ThreeDsCertsConfig};
use acquiring::threeds::CertsConfigCache;
use acquiring_integration_tests::{setup_tracing, ScriptedApi};
use anyhow::Result;

fn config_with(payment_system: &str) -> ThreeDsCertsConfig {
    ThreeDsCertsConfig {
        certs_info: vec![DirectoryServerCert {
            payment_system: payment_system.to_string(),
            directory_server_id: "A000000658".to_string(),
            public_key: "-----BEGIN PUBLIC KEY-----".to_string(),
            algorithm: None,
        }],
    }
}

/// A failed refresh keeps the last-known-good configuration.
#[tokio::test]
async fn failed_refresh_keeps_last_known_good() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let cache = CertsConfigCache::new(Duration::from_secs(0));

    // First refresh fails: still serving the empty default.
    api.push_certs_config(Err(acquiring::Error::Custom("cdn down".to_string())));
    cache.refresh_if_stale(api.as_ref()).await;
    assert!(cache.current().certs_info.is_empty());

    // Second refresh succeeds.
    api.push_certs_config(Ok(config_with("mir")));
    cache.refresh_if_stale(api.as_ref()).await;
    assert_eq!(cache.current().certs_info[0].payment_system, "mir");

    // Third refresh fails again: the good config is retained.
    api.push_certs_config(Err(acquiring::Error::Custom("cdn down".to_string())));
    cache.refresh_if_stale(api.as_ref()).await;
    assert_eq!(cache.current().certs_info[0].payment_system, "mir");
    Ok(())
}

/// Refreshes inside the interval are skipped.
#[tokio::test]
async fn fresh_config_is_not_refetched() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let cache = CertsConfigCache::new(Duration::from_secs(240 * 60));

    api.push_certs_config(Ok(config_with("visa")));
    cache.refresh_if_stale(api.as_ref()).await;
    cache.refresh_if_stale(api.as_ref()).await;
    cache.refresh_if_stale(api.as_ref()).await;

    assert_eq!(api.call_count("CertsConfig"), 1);
    assert_eq!(cache.current().certs_info[0].payment_system, "visa");
    Ok(())
}
