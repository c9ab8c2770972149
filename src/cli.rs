// CLI layer: argument definitions and the upload -> filter -> write flow.
// The binary (`main.rs`) parses `Args`, sets up logging and calls `run`.
// Files are opened and closed here; the API client only sees readers and
// writers.

use crate::api::{Client, PhotoCode, KNOWN_FILTERS};
use crate::config::{ClientConfig, DEFAULT_API_HOST, DEFAULT_USER_AGENT};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Apply FaceApp filters to a photo.
#[derive(Parser, Debug)]
#[command(name = "faceapp", version, about, long_about = None)]
#[command(after_help = format!("Known filters: {}", KNOWN_FILTERS.join(", ")))]
pub struct Args {
    /// FaceApp filter name
    pub filter: String,

    /// Input file name, `-` for stdin
    pub input: String,

    /// Output file name; stdout when omitted or `-`
    pub output: Option<String>,

    /// Crop output image to face region
    #[arg(
        long,
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub cropped: bool,

    /// FaceApp API host
    #[arg(long, env = "FACEAPP_API_HOST", default_value = DEFAULT_API_HOST)]
    pub api_host: String,

    /// Device id sent to FaceApp; random when not set
    #[arg(long, env = "FACEAPP_DEVICE_ID")]
    pub device_id: Option<String>,

    /// User-Agent header for API requests
    #[arg(long, env = "FACEAPP_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Extra header sent with every request, may be repeated
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Abort requests that take longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Keep quiet; overrides --debug
    #[arg(long)]
    pub silent: bool,

    /// Print HTTP requests/responses to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Client configuration described by these arguments.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_host: self.api_host.clone(),
            user_agent: self.user_agent.clone(),
            device_id: self.device_id.clone(),
            extra_headers: self.headers.iter().cloned().collect(),
            cropped: self.cropped,
            log_traffic: self.debug && !self.silent,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

enum Output {
    Stdout,
    File(File),
}

/// Run one upload and filter round trip.
pub fn run(args: &Args) -> Result<()> {
    let input = open_input(&args.input)?;
    let output = open_output(args.output.as_deref())?;

    let client = Client::new(args.client_config()).context("Failed to set up FaceApp client")?;
    debug!(device_id = client.device_id(), "Client ready");

    let code = client.upload_photo(input)?;
    info!("Successfully uploaded input photo. Result code = {code}");
    info!("Applying filter '{}'", args.filter);

    match output {
        Output::Stdout => {
            let mut stdout = client.apply_filter_into(&code, &args.filter, io::stdout().lock())?;
            stdout.flush()?;
        }
        Output::File(file) => {
            let bytes = download_to_file(&client, &code, &args.filter, file, args.silent)?;
            debug!(bytes, "Output written");
        }
    }

    info!("Done.");
    Ok(())
}

fn open_input(input: &str) -> Result<Box<dyn Read>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Unable to read input from stdin")?;
        return Ok(Box::new(Cursor::new(buf)));
    }

    let file = File::open(input).with_context(|| format!("Unable to open input {input}"))?;
    Ok(Box::new(file))
}

fn open_output(output: Option<&str>) -> Result<Output> {
    match output {
        None | Some("-") => Ok(Output::Stdout),
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Unable to open output {path}"))?;
            Ok(Output::File(file))
        }
    }
}

/// Stream the filtered photo into `file`, showing download progress unless
/// `silent` is set.
fn download_to_file(
    client: &Client,
    code: &PhotoCode,
    filter: &str,
    mut file: File,
    silent: bool,
) -> Result<u64> {
    let pb = if silent {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message("downloading...");

    let total = client.apply_filter_with(code, filter, |chunk, offset, total| {
        if offset == 0 {
            if let Some(total) = total {
                pb.set_length(total);
            }
        }
        file.write_all(chunk)?;
        pb.set_position(offset + chunk.len() as u64);
        Ok(())
    })?;

    file.flush()?;
    pb.finish_and_clear();
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("faceapp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_arguments() {
        let args = parse(&["female", "in.jpg", "out.jpg"]);
        assert_eq!(args.filter, "female");
        assert_eq!(args.input, "in.jpg");
        assert_eq!(args.output.as_deref(), Some("out.jpg"));

        let args = parse(&["old", "-"]);
        assert!(args.output.is_none());
    }

    #[test]
    fn cropped_flag_forms() {
        assert!(parse(&["f", "in"]).cropped);
        assert!(parse(&["--cropped", "f", "in"]).cropped);
        assert!(!parse(&["--cropped=false", "f", "in"]).cropped);
        assert!(parse(&["--cropped=true", "f", "in"]).cropped);
    }

    #[test]
    fn config_from_args() {
        let args = parse(&[
            "--api-host=http://localhost:3001",
            "--device-id=latifwch",
            "--header",
            "X-Test=1",
            "--timeout=5",
            "--debug",
            "smile",
            "in.jpg",
        ]);
        let config = args.client_config();
        assert_eq!(config.api_host, "http://localhost:3001");
        assert_eq!(config.device_id.as_deref(), Some("latifwch"));
        assert_eq!(config.extra_headers.get("X-Test").map(String::as_str), Some("1"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(config.log_traffic);
    }

    #[test]
    fn silent_overrides_debug() {
        let config = parse(&["--debug", "--silent", "f", "in"]).client_config();
        assert!(!config.log_traffic);
    }

    #[test]
    fn rejects_unknown_options() {
        let result = Args::try_parse_from(["faceapp", "--bogus", "f", "in"]);
        assert!(result.is_err());
    }

    #[test]
    fn header_parsing() {
        assert_eq!(
            parse_header("X-Token=a=b").unwrap(),
            ("X-Token".to_string(), "a=b".to_string())
        );
        assert!(parse_header("novalue").is_err());
        assert!(parse_header("=value").is_err());
    }
}
