// Local HTTP fixture server for integration tests.
//
// An axum router on a background tokio runtime replays canned responses in
// order and records every request it receives. Requests beyond the queued
// fixtures get a 500.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

/// Size of the filtered image returned by the recorded API session.
pub const FILTERED_SIZE: usize = 10174;

pub const PHOTO_CODE: &str = "20170417145829yocc";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub target: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Debug, Clone)]
pub struct Fixture {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Fixture {
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    pub fn image(body: Vec<u8>) -> Self {
        Self::new(200).header("Content-Type", "image/jpeg").body(body)
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(302).header("Location", location).body("Moved")
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        for (name, value) in self.headers {
            response.headers_mut().append(
                HeaderName::from_bytes(name.as_bytes()).expect("valid header name"),
                HeaderValue::from_str(&value).expect("valid header value"),
            );
        }
        response
    }
}

#[derive(Clone, Default)]
struct Replay {
    fixtures: Arc<Mutex<VecDeque<Fixture>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn replay(
    State(state): State<Replay>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().expect("requests lock").push(RecordedRequest {
        method,
        target: uri.to_string(),
        headers,
        body,
    });

    match state.fixtures.lock().expect("fixtures lock").pop_front() {
        Some(fixture) => fixture.into_response(),
        None => Fixture::new(500).body("no fixture left").into_response(),
    }
}

pub struct FixtureServer {
    url: String,
    state: Replay,
}

impl FixtureServer {
    pub fn start(fixtures: Vec<Fixture>) -> Self {
        let state = Replay::default();
        state.fixtures.lock().expect("fixtures lock").extend(fixtures);

        // Bound before returning so the client never races the server.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));

        let app = Router::new().fallback(replay).with_state(state.clone());
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("fixture server");
            });
        });

        Self { url, state }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

/// Bytes that look enough like a JPEG for the tests: SOI marker, filler,
/// EOI marker.
pub fn sample_jpeg(len: usize) -> Vec<u8> {
    assert!(len >= 4);
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend((0..len - 4).map(|i| (i % 251) as u8));
    bytes.extend([0xFF, 0xD9]);
    bytes
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
