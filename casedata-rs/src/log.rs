//! Logging setup shared by the pipeline binaries. Messages go to stderr so
//! that the summary printed on stdout stays machine-readable.

use env_logger::{Builder, WriteStyle};
pub use log::LevelFilter;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

/// Maps a `-v` count to a level: 0 warn, 1 info, 2 debug, 3+ trace.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => DEFAULT_LOG_LEVEL,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(verbosity: u8) {
    let _ = Builder::new()
        .filter_level(level_for_verbosity(verbosity))
        .write_style(WriteStyle::Auto)
        .format_timestamp(None)
        .try_init();
}
