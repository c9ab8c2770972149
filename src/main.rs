// Entrypoint for the `faceapp` binary.
// - Parses arguments with clap and sets up logging.
// - Reports failures as `Error: ...` on stderr and exits non-zero.

use clap::Parser;
use faceapp_cli::cli::{self, Args};
use std::process::ExitCode;
use tracing::{debug, error};

mod logging;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.silent, args.debug);

    match cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {e:#}");
            debug!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
