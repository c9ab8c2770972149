// HTTP transport bound to a single API host.
//
// Wraps one blocking reqwest client so the upload and the filter request of
// an invocation share its connection pool. Default headers are fixed when
// the transport is built.

use crate::config::ClientConfig;
use crate::error::{FaceAppError, Result};
use reqwest::blocking::{multipart::Form, Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Method, Url};
use tracing::debug;

/// Header carrying the device id.
pub const DEVICE_ID_HEADER: &str = "x-faceapp-deviceid";

/// Tracing target used when traffic logging is enabled.
pub const WIRE_TARGET: &str = "faceapp::wire";

pub struct Transport {
    client: Client,
    base: Url,
    headers: HeaderMap,
    log_traffic: bool,
}

impl Transport {
    /// Build the transport for `config`, sending `device_id` on every request.
    pub fn new(config: &ClientConfig, device_id: &str) -> Result<Self> {
        let base = parse_api_host(&config.api_host)?;
        let headers = default_headers(config, device_id)?;

        // Certificate verification stays at reqwest's default (on). Redirects
        // are not followed: any 3xx is handed back as a failed response.
        let client = Client::builder()
            .default_headers(headers.clone())
            .redirect(Policy::none())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            headers,
            log_traffic: config.log_traffic,
        })
    }

    /// URL for `segments` below the API host. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse_api_host rejects cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and return the response with its body still unread.
    pub fn send(&self, method: Method, url: Url, form: Option<Form>) -> Result<Response> {
        if self.log_traffic {
            debug!(target: WIRE_TARGET, "-> {method} {url}");
            for (name, value) in &self.headers {
                debug!(target: WIRE_TARGET, "-> {name}: {value:?}");
            }
        }

        let mut request = self.client.request(method, url);
        if let Some(form) = form {
            if self.log_traffic {
                debug!(target: WIRE_TARGET, "-> content-type: multipart/form-data; boundary={}", form.boundary());
            }
            request = request.multipart(form);
        }

        let response = request.send()?;

        if self.log_traffic {
            debug!(target: WIRE_TARGET, "<- {:?} {}", response.version(), response.status());
            for (name, value) in response.headers() {
                debug!(target: WIRE_TARGET, "<- {name}: {value:?}");
            }
        }

        Ok(response)
    }

    /// Mirror a response body that was read as text.
    pub fn log_body(&self, body: &str) {
        if self.log_traffic {
            debug!(target: WIRE_TARGET, "<- {body}");
        }
    }
}

fn parse_api_host(api_host: &str) -> Result<Url> {
    let url = Url::parse(api_host)
        .map_err(|e| FaceAppError::Config(format!("invalid api host {api_host:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(FaceAppError::Config(format!(
            "api host must be an http or https URL, got {api_host:?}"
        )));
    }

    Ok(url)
}

fn default_headers(config: &ClientConfig, device_id: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(&config.user_agent)?);
    headers.insert(
        HeaderName::from_static(DEVICE_ID_HEADER),
        header_value(device_id)?,
    );

    // Extra headers win over the identity headers, like a hash merge.
    for (name, value) in &config.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FaceAppError::Config(format!("invalid header name {name:?}: {e}")))?;
        headers.insert(name, header_value(value)?);
    }

    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FaceAppError::Config(format!("invalid header value {value:?}: {e}")))
}
