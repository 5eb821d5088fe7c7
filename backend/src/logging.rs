//! Log output setup.
//!
//! Library code logs through the `log` macros. `init_logging` installs a
//! `tracing` fmt subscriber, which also picks up those `log` records.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns false when one was already installed.
pub fn init_logging(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}. Falling back to info.", filter, e);
        EnvFilter::new("info")
    });

    match tracing_subscriber::fmt().with_env_filter(env_filter).try_init() {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!("Logging already initialized");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("debug");
        assert!(!init_logging("not a [valid filter"));
        log::info!("still logging");
    }
}
