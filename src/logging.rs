use env_logger::{Builder, Env};
pub use log::LevelFilter;

/// Installs `env_logger` for binaries, benches and tests that drive a
/// [`Space`](crate::Space).
///
/// `default_level` applies to this crate's own targets only: `debug` reports
/// skipped joints and sleep transitions, `trace` adds one line per step.
/// `RUST_LOG` replaces the default entirely. Calling `init` again is a no-op.
pub fn init(default_level: LevelFilter) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter(default_level)))
        .format_timestamp(None)
        .try_init();
}

fn default_filter(level: LevelFilter) -> String {
    format!("{}={}", env!("CARGO_PKG_NAME"), level.to_string().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_crate() {
        assert_eq!(default_filter(LevelFilter::Debug), "rigid2d=debug");
        assert_eq!(default_filter(LevelFilter::Off), "rigid2d=off");
    }

    #[test]
    fn test_init_twice_keeps_first_logger() {
        init(LevelFilter::Trace);
        init(LevelFilter::Warn);
        log::debug!("second init ignored");
    }
}
