//! Log output for the command line.
//!
//! The subscriber is installed for the current thread only and removed when
//! the returned guard is dropped.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// How much the CLI logs, from the number of `-v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Info,
    Debug,
}

impl Verbosity {
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::Quiet,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    pub fn level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise the verbosity level.
pub fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.level()))
}

/// Installs a stderr subscriber until the guard is dropped.
pub fn init(verbosity: Verbosity) -> DefaultGuard {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_filter(filter(verbosity)),
        )
        .set_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_occurrences() {
        assert_eq!(Verbosity::from_occurrences(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_occurrences(1), Verbosity::Info);
        assert_eq!(Verbosity::from_occurrences(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_occurrences(7), Verbosity::Debug);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.level(), "warn");
        assert_eq!(Verbosity::Info.level(), "info");
        assert_eq!(Verbosity::Debug.level(), "debug");
    }

    #[test]
    fn test_init_is_scoped() {
        let guard = init(Verbosity::Debug);
        tracing::debug!("visible while the guard lives");
        drop(guard);
    }
}
