//! Logging configuration
//!
//! Initializes tracing for the application.

/// Initializes logging with the specified default level.
///
/// `HOOKLINE_LOG` overrides the level with a full `EnvFilter` directive.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_env("HOOKLINE_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        // Just verify it doesn't panic, even when called twice
        init_logging("debug");
        init_logging("info");
    }
}
