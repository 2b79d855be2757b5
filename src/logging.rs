//! Logger setup for the `funset` binary.
//!
//! The library only talks to the `log` facade. The binary installs
//! `env_logger`, which honours `RUST_LOG`; without it the default level is
//! derived from the `-v` count.

use env_logger::Env;
use log::LevelFilter;

pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. Calling it twice is harmless.
pub fn init_logging(verbosity: u8) {
    let default_level = level_for_verbosity(verbosity).to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}
