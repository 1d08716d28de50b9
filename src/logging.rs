use crate::util::hex::format_hex_compact;
use log::{debug, error, info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// The level comes from `RUST_LOG`; calling this twice is harmless.
pub fn init_logger() {
    let _ = env_logger::try_init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a debug message.
pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}

/// Logs frame bytes as hex at debug level, e.g. `TX [5 bytes]: 10 40 01 41 16`.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    if log_enabled!(Level::Debug) {
        debug!(
            "{prefix} [{} bytes]: {}",
            data.len(),
            format_hex_compact(data)
        );
    }
}
