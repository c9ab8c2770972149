// Logging initialization.
//
// Log output goes to stderr; stdout may carry the filtered image.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// * `silent` - suppress all output, including `RUST_LOG` settings
/// * `debug` - enable debug output for this crate and HTTP traffic
pub fn init(silent: bool, debug: bool) {
    let filter = if silent {
        EnvFilter::new("off")
    } else {
        let default_level = if debug {
            "info,faceapp_cli=debug,faceapp::wire=debug"
        } else {
            "info"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .without_time()
                .with_target(debug)
                .with_level(debug)
                .with_writer(std::io::stderr),
        )
        .init();
}
