//! Logging subsystem: compact or JSON stdout plus optional rolling files.

mod manager;
mod types;

#[cfg(test)]
mod tests;

pub use manager::{build_filter, init, LoggingError};
pub use types::{FileLoggingConfig, LoggerConfig, StdoutConfig};

// Re-export tracing-appender types for convenience
pub use tracing_appender::rolling::Rotation;
