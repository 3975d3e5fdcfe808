//! Logger bootstrap.
//!
//! The engine only talks to the `log` facade. Binaries and tests call [`init`]
//! once to route records to `env_logger` (filter with `RUST_LOG`).

/// Install `env_logger` as the global logger.
///
/// Calling this more than once is harmless: the second call keeps the logger
/// that is already installed and only reports it.
pub fn init() {
    if let Err(e) = env_logger::try_init() {
        log::debug!("Logger already initialized: {}", e);
    }
}

/// Same as [`init`] but captures output the way the test harness expects.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
