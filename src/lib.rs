// Library root
// -----------
// This crate exposes the FaceApp API client and the CLI flow built on it.
// The binary (`main.rs`) only parses arguments, sets up logging and hands
// over to `cli::run`.
//
// Module responsibilities:
// - `api`: upload a photo, apply a filter, translate API errors.
// - `transport`: the HTTP client bound to the configured host.
// - `config`: `ClientConfig` and its defaults.
// - `device`: device id generation.
// - `error`: the crate's error type.
// - `cli`: argument definitions and file handling for the binary.
pub mod api;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod transport;

pub use api::{Client, PhotoCode, KNOWN_FILTERS};
pub use config::ClientConfig;
pub use error::{ApiError, FaceAppError, Result};
