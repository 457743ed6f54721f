//! Console tracing for the `lexaudit` binary.
//!
//! Logs go to stderr so listings on stdout stay pipeable.
//!
//!   lexaudit --debug ...                 # debug level, with targets
//!   RUST_LOG=lexaudit_sync=debug lexaudit review

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

pub fn init(debug: bool) -> Result<()> {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
