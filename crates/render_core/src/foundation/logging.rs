//! Logging utilities and structured logging support

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    // A second initialization (tests, embedding applications) is harmless
    let _ = env_logger::try_init();
}

/// Initialize the logging system with an explicit filter such as `"render_core=debug"`
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
