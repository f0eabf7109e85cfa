//! Console logging setup for the terrain binaries.
//!
//! The library itself only emits `tracing` events; binaries decide where they go.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a CLI level is given.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter for a requested level, letting `RUST_LOG` take precedence.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    let fallback = level.unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber: human-readable lines with uptime and target.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_filter() {
        let filter = EnvFilter::new("debug,terrain_generator::erosion=trace");
        let rendered = format!("{}", filter);
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("terrain_generator::erosion=trace"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Some("warn"));
        init_logging(Some("debug"));
    }
}
