//! Tracing/logging setup shared by the catalog binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};

/// Initialize process-wide tracing with JSON output.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize process-wide tracing with the given output format.
pub fn init_with_format(format: LogFormat) {
    tracing::init_with_format(format);
}
