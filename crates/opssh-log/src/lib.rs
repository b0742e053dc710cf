// ABOUTME: Shared logging setup for opssh
// ABOUTME: init() for the default INFO level, init_with_level() when --verbose asks for more

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
///
/// Stdout is left to the importer's progress output so it can be piped
/// without interleaved log lines.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Logging to stderr with a caller-chosen default level. RUST_LOG directives
/// for specific targets still apply on top of it.
pub fn init_with_level(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter_for(level))
        .init();
}

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(level.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_init() {
        let _ = super::init as fn();
    }

    #[test]
    fn exports_init_with_level() {
        let _ = super::init_with_level as fn(Level);
    }

    #[test]
    fn filter_includes_requested_level() {
        let filter = filter_for(Level::DEBUG);
        assert!(filter.to_string().contains("debug"));
    }
}
