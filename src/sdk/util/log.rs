use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs the process logger. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: LevelFilter) {
    let filter = default_level.as_str().to_ascii_lowercase();
    // try_init: tests and embedding hosts may already have installed a logger
    let _ = Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();
}

/// `info` normally, `debug` with one `-v`, `trace` beyond that.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
