//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    if env_logger::try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
