//! Utility functions and helpers

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Initialize `env_logger` with `default_level` unless `RUST_LOG` overrides it.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_level),
    )
    .try_init();
}

/// Logging setup for tests: captured output, debug level
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
