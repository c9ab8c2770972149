// Client configuration with documented defaults.

use std::collections::BTreeMap;
use std::time::Duration;

/// Production API host.
pub const DEFAULT_API_HOST: &str = "https://node-01.faceapp.io";

/// User-Agent the official Android app sent.
pub const DEFAULT_USER_AGENT: &str = "FaceApp/1.0.229 (Linux; Android 4.4)";

/// Settings for a [`Client`](crate::api::Client).
///
/// The configuration is consumed by `Client::new`; it cannot change for the
/// lifetime of the client, so every request carries the same headers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, `http` or `https`
    pub api_host: String,

    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Value of the `X-FaceApp-DeviceID` header; generated when `None`
    pub device_id: Option<String>,

    /// Additional headers sent with every request
    pub extra_headers: BTreeMap<String, String>,

    /// Ask the server to crop the output to the detected face
    pub cropped: bool,

    /// Mirror request/response traffic to the `faceapp::wire` tracing target
    pub log_traffic: bool,

    /// Whole-request timeout; no timeout when `None`
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            device_id: None,
            extra_headers: BTreeMap::new(),
            cropped: true,
            log_traffic: false,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cropped(mut self, cropped: bool) -> Self {
        self.cropped = cropped;
        self
    }

    pub fn with_log_traffic(mut self, log_traffic: bool) -> Self {
        self.log_traffic = log_traffic;
        self
    }
}
