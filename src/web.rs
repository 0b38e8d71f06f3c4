#![cfg(not(tarpaulin_include))]

use keystroke_form::{Config, app, init_logging};
use std::env;
use std::path::PathBuf;

/// Main entry point for the keystroke form server
///
/// An optional first argument names a TOML config file; without it
/// `keystrokes.toml` in the working directory is used if present.
/// `KEYSTROKES_*` environment variables override either.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = Config::load_from(config_path.as_deref())?;

    init_logging(config.logging.verbosity);

    app::run(config).await?;
    Ok(())
}
