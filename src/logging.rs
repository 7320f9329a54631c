//! Subscriber setup for drivers that want the node's `tracing` events.
//!
//! Nodes only emit events; where they end up is decided here (stderr, with
//! `RUST_LOG` taking precedence over the default level).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a global fmt subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already set, in which case
/// nothing changes.
pub fn init_logging(default_level: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_ignored() {
        init_logging("warn");
        assert!(!init_logging("debug"));
    }
}
