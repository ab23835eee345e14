//! Logging utilities and structured logging support

use env_logger::Env;
use log::LevelFilter;

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Logs at `default_level` unless `RUST_LOG` says otherwise. Panics if a
/// logger is already installed.
pub fn init(default_level: LevelFilter) {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str())).init();
}
