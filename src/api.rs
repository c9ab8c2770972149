// API client module: uploads a photo to FaceApp, asks for a filter to be
// applied and streams the filtered image back. All calls are blocking and
// none are retried.

use crate::config::ClientConfig;
use crate::device::{generate_device_id, DEVICE_ID_LENGTH};
use crate::error::{ApiError, FaceAppError, Result};
use crate::transport::Transport;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use tracing::debug;

/// Filters the server is known to accept. Only used for help text; any name
/// is passed through to the server.
pub const KNOWN_FILTERS: &[&str] = &[
    "smile", "smile_2", "hot", "old", "young", "female", "male",
];

/// Error code used when the server answers 404 without naming an error.
pub const BAD_PHOTO_CODE: &str = "bad_photo_code";

/// Error code used when the server gives no usable error information.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Response header naming the error of a failed filter request.
const ERROR_CODE_HEADER: &str = "x-faceapp-errorcode";

/// Messages for error codes the server is known to return. `%s` is filled
/// with the photo code, then the filter name.
const KNOWN_ERRORS: &[(&str, &str)] = &[
    ("bad_filter_id", "Unknown filter"),
    (BAD_PHOTO_CODE, "Specified photo code (%s) not found"),
];

const API_PREFIX: [&str; 3] = ["api", "v2.3", "photos"];

const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Server-issued identifier of an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoCode(String);

impl PhotoCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PhotoCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for PhotoCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for PhotoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Successful upload response.
#[derive(Deserialize, Debug)]
struct UploadResponse {
    code: String,
}

/// Failed upload response: `{"err": {"code": ..., "desc": ...}}`.
#[derive(Deserialize, Debug)]
struct UploadErrorResponse {
    err: UploadErrorDetail,
}

#[derive(Deserialize, Debug)]
struct UploadErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    desc: String,
}

/// FaceApp API client. Holds the transport and the device id used for
/// every request it sends.
pub struct Client {
    transport: Transport,
    device_id: String,
    cropped: bool,
}

impl Client {
    /// Build a client from `config`, generating a device id if none is set.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let device_id = config
            .device_id
            .clone()
            .unwrap_or_else(|| generate_device_id(DEVICE_ID_LENGTH));
        let transport = Transport::new(&config, &device_id)?;

        Ok(Self {
            transport,
            device_id,
            cropped: config.cropped,
        })
    }

    /// Device id sent as `X-FaceApp-DeviceID`.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Upload a photo and return the code the server assigned to it.
    ///
    /// The stream is read to its end and always declared as `image.jpg`
    /// with type `image/jpeg`; the server decides whether it is acceptable.
    pub fn upload_photo<R: Read>(&self, mut photo: R) -> Result<PhotoCode> {
        let mut bytes = Vec::new();
        photo.read_to_end(&mut bytes)?;
        debug!(bytes = bytes.len(), "Uploading photo");

        let form = Form::new().part("file", photo_part(bytes)?);

        let url = self.transport.endpoint(&API_PREFIX);
        let response = self.transport.send(Method::POST, url, Some(form))?;
        let status = response.status();
        let body = response.text()?;
        self.transport.log_body(&body);

        if !status.is_success() {
            return Err(upload_error(&body).into());
        }

        parse_upload_response(&body)
    }

    /// Apply `filter` and return the image in a new buffer positioned at
    /// its start.
    pub fn apply_filter(&self, code: &PhotoCode, filter: &str) -> Result<Cursor<Vec<u8>>> {
        let mut buffer = self.apply_filter_into(code, filter, Cursor::new(Vec::new()))?;
        buffer.set_position(0);
        Ok(buffer)
    }

    /// Apply `filter` and write the whole image into `dest`, which is
    /// returned positioned after the written data.
    pub fn apply_filter_into<W: Write>(
        &self,
        code: &PhotoCode,
        filter: &str,
        mut dest: W,
    ) -> Result<W> {
        self.stream_filter(code, filter, |chunk, _, _| dest.write_all(chunk))?;
        Ok(dest)
    }

    /// Apply `filter` and hand the image to `on_chunk` as it arrives.
    ///
    /// `on_chunk` receives each chunk read from the connection, the number
    /// of bytes delivered before it, and the `Content-Length` the server
    /// declared. Chunk sizes follow the transport, not any image structure.
    /// Returning an error from `on_chunk` stops the download.
    ///
    /// Returns the declared length, or the number of bytes received when the
    /// server declared none.
    pub fn apply_filter_with<F>(&self, code: &PhotoCode, filter: &str, on_chunk: F) -> Result<u64>
    where
        F: FnMut(&[u8], u64, Option<u64>) -> io::Result<()>,
    {
        let (received, declared) = self.stream_filter(code, filter, on_chunk)?;
        Ok(declared.unwrap_or(received))
    }

    fn stream_filter<F>(
        &self,
        code: &PhotoCode,
        filter: &str,
        mut on_chunk: F,
    ) -> Result<(u64, Option<u64>)>
    where
        F: FnMut(&[u8], u64, Option<u64>) -> io::Result<()>,
    {
        debug!(%code, filter, cropped = self.cropped, "Applying filter");

        let url = self.filter_url(code, filter);
        let mut response = self.transport.send(Method::GET, url, None)?;
        let status = response.status();

        if !status.is_success() {
            let header_code = response
                .headers()
                .get(ERROR_CODE_HEADER)
                .and_then(|value| value.to_str().ok());
            return Err(filter_error(header_code, status, code.as_str(), filter).into());
        }

        let total = response.content_length();
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let mut offset = 0u64;

        loop {
            let n = match response.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            on_chunk(&buf[..n], offset, total)?;
            offset += n as u64;
        }

        debug!(bytes = offset, ?total, "Filtered photo received");
        Ok((offset, total))
    }

    fn filter_url(&self, code: &PhotoCode, filter: &str) -> Url {
        let [api, version, photos] = API_PREFIX;
        let mut url = self
            .transport
            .endpoint(&[api, version, photos, code.as_str(), "filters", filter]);
        url.query_pairs_mut()
            .append_pair("cropped", if self.cropped { "true" } else { "false" });
        url
    }
}

/// Multipart part for the photo, always declared as a JPEG.
fn photo_part(bytes: Vec<u8>) -> Result<Part> {
    Part::bytes(bytes)
        .file_name("image.jpg")
        .mime_str("image/jpeg")
        .map_err(|e| FaceAppError::Config(format!("invalid upload content type: {e}")))
}

fn parse_upload_response(body: &str) -> Result<PhotoCode> {
    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| FaceAppError::Protocol(format!("invalid upload response: {e}")))?;

    if parsed.code.is_empty() {
        return Err(FaceAppError::Protocol(
            "upload response contains an empty photo code".to_string(),
        ));
    }

    Ok(PhotoCode(parsed.code))
}

/// Translate a failed upload body into an `ApiError`.
fn upload_error(body: &str) -> ApiError {
    match serde_json::from_str::<UploadErrorResponse>(body) {
        Ok(UploadErrorResponse { err }) => {
            let message = format!("({}) {}", err.code, err.desc);
            ApiError::new(err.code, message)
        }
        Err(_) => ApiError::new(UNKNOWN_ERROR, body),
    }
}

/// Translate a failed filter response into an `ApiError`.
fn filter_error(header_code: Option<&str>, status: StatusCode, code: &str, filter: &str) -> ApiError {
    let error_code = match header_code.filter(|c| !c.is_empty()) {
        Some(c) => c,
        None if status == StatusCode::NOT_FOUND => BAD_PHOTO_CODE,
        None => UNKNOWN_ERROR,
    };

    let template = KNOWN_ERRORS
        .iter()
        .find(|(known, _)| *known == error_code)
        .map_or(error_code, |(_, message)| *message);

    ApiError::new(error_code, fill_template(template, &[code, filter]))
}

/// Replace each `%s` in `template` with the next argument. Placeholders
/// beyond the supplied arguments are left as they are.
fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(idx) = rest.find("%s") {
        out.push_str(&rest[..idx]);
        out.push_str(args.next().copied().unwrap_or("%s"));
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}
