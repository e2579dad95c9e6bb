//! 3-D Secure challenge orchestration.
//!
//! The issuer answers Check3dsVersion with the protocol version it
//! supports. Versions from 2.1.0 upward run the app-based flow: device
//! fingerprint data is collected and shipped with FinishAuthorize, and the
//! challenge result comes back as a CRes. Older versions run the browser
//! redirect flow with PaReq/MD posted to the ACS. Either way the challenge
//! outcome is handed back to the owning payment process as a
//! [`ThreeDsStatus`] resume signal.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use crate::client::{
    AcquiringApi, Check3dsVersionResponse, FinishAuthorizeResponse, Submit3dsAuthorizationRequest,
    Submit3dsAuthorizationResponse, Submit3dsAuthorizationV2Request,
};
use crate::env::SdkEnvironment;
use crate::models::PaymentId;
use crate::Error;

mod config;

pub use config::{CertsConfigCache, DEFAULT_REFRESH_INTERVAL};

/// Version threshold for the app-based flow.
const APP_BASED_MIN_VERSION: (u32, u32, u32) = (2, 1, 0);

/// True when the issuer's protocol version selects the app-based flow.
pub fn is_app_based_version(version: &str) -> bool {
    parse_version(version) >= APP_BASED_MIN_VERSION
}

fn parse_version(version: &str) -> (u32, u32, u32) {
    let mut parts = version
        .split('.')
        .map(|part| part.trim().parse::<u32>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

/// Parameters of one pending 3-D Secure challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeDsData {
    /// Payment the challenge belongs to
    pub payment_id: PaymentId,
    /// Issuer protocol version, verbatim from Check3dsVersion
    pub version: String,
    /// ACS challenge endpoint
    pub acs_url: String,
    /// Browser flow: payment authentication request
    pub pa_req: Option<String>,
    /// Browser flow: merchant data blob
    pub md: Option<String>,
    /// App-based flow: directory-server transaction id
    pub server_trans_id: Option<String>,
    /// App-based flow: ACS transaction id
    pub acs_trans_id: Option<String>,
}

/// A challenge waiting for the customer, as handed to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeDsState {
    /// Challenge parameters
    pub data: ThreeDsData,
    /// True for the app-based flow, false for the browser redirect
    pub app_based: bool,
}

/// Outcome of a 3-D Secure challenge, posted back by the host UI.
#[derive(Debug, Clone)]
pub enum ThreeDsStatus {
    /// Challenge passed
    Success {
        /// Challenge the outcome belongs to
        data: ThreeDsData,
        /// Transaction status reported by the ACS, e.g. "Y"
        trans_status: String,
    },
    /// Customer backed out of the challenge
    Canceled,
    /// Challenge surface failed
    Error(Arc<Error>),
}

/// Host-provided source of device fingerprint fields.
pub trait DeviceDataSource: Send + Sync {
    /// Timezone offset from UTC in minutes.
    fn timezone_offset_minutes(&self) -> i32;
    /// Screen width in physical pixels.
    fn screen_width(&self) -> u32;
    /// Screen height in physical pixels.
    fn screen_height(&self) -> u32;
    /// BCP-47 language tag of the device locale.
    fn language(&self) -> String;
}

/// Drives version decisions, device data collection and challenge-result
/// submission for the payment processes.
pub struct ThreeDsCoordinator {
    api: Arc<dyn AcquiringApi>,
    env: Arc<SdkEnvironment>,
}

impl ThreeDsCoordinator {
    /// Coordinator reading fingerprint data and the certificate cache from
    /// the shared environment.
    pub fn new(api: Arc<dyn AcquiringApi>, env: Arc<SdkEnvironment>) -> Self {
        Self { api, env }
    }

    /// Cached directory-server certificates, refreshing first when stale.
    pub async fn certs_config(&self) -> Arc<crate::client::ThreeDsCertsConfig> {
        self.env.certs.refresh_if_stale(self.api.as_ref()).await;
        self.env.certs.current()
    }

    /// Device fingerprint fields for the FinishAuthorize `DATA` map.
    pub fn collect_device_data(&self) -> HashMap<String, String> {
        let device_data = &self.env.device_data;
        HashMap::from([
            (
                "sdkAppID".to_string(),
                self.env.installation_id().to_string(),
            ),
            ("language".to_string(), device_data.language()),
            (
                "timeZone".to_string(),
                device_data.timezone_offset_minutes().to_string(),
            ),
            (
                "screenWidth".to_string(),
                device_data.screen_width().to_string(),
            ),
            (
                "screenHeight".to_string(),
                device_data.screen_height().to_string(),
            ),
        ])
    }

    /// Build the pending challenge from a FinishAuthorize response, when
    /// the issuer demanded one.
    pub fn challenge_state(
        &self,
        version: &Check3dsVersionResponse,
        finish: &FinishAuthorizeResponse,
    ) -> Option<ThreeDsState> {
        let acs_url = finish.acs_url.clone()?;
        let data = ThreeDsData {
            payment_id: finish.payment_id,
            version: version.version.clone(),
            acs_url,
            pa_req: finish.pa_req.clone(),
            md: finish.md.clone(),
            server_trans_id: finish
                .tds_server_trans_id
                .clone()
                .or_else(|| version.tds_server_trans_id.clone()),
            acs_trans_id: finish.acs_trans_id.clone(),
        };
        Some(ThreeDsState {
            app_based: is_app_based_version(&version.version),
            data,
        })
    }

    /// Post a passed challenge back to the acquiring API.
    ///
    /// Browser-flow challenges post PaRes/MD; app-based challenges confirm
    /// by payment id.
    #[instrument(skip_all, fields(payment_id = %data.payment_id))]
    pub async fn submit_authorization(
        &self,
        data: &ThreeDsData,
        pa_res: Option<String>,
    ) -> Result<Submit3dsAuthorizationResponse, Error> {
        if is_app_based_version(&data.version) {
            self.api
                .submit_3ds_authorization_v2(Submit3dsAuthorizationV2Request {
                    payment_id: data.payment_id,
                })
                .await
        } else {
            let md = data.md.clone().ok_or_else(|| {
                Error::Custom("browser challenge result is missing MD".to_string())
            })?;
            let pa_res = pa_res.ok_or_else(|| {
                Error::Custom("browser challenge result is missing PaRes".to_string())
            })?;
            self.api
                .submit_3ds_authorization(Submit3dsAuthorizationRequest { md, pa_res })
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_based_threshold_is_2_1_0() {
        assert!(is_app_based_version("2.1.0"));
        assert!(is_app_based_version("2.2.0"));
        assert!(is_app_based_version("3.0.0"));
        assert!(!is_app_based_version("2.0.1"));
        assert!(!is_app_based_version("1.0.2"));
    }

    #[test]
    fn malformed_version_falls_back_to_browser_flow() {
        assert!(!is_app_based_version(""));
        assert!(!is_app_based_version("two.one"));
    }
}
