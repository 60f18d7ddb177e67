//! Logging (tracing) related code.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a given `-v` count.
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "debug,numincrement=trace",
    }
}

/// Boilerplate logging initialization.
///
/// `RUST_LOG` wins over `env_min` when set; an unparseable `RUST_LOG` falls back to `env_min`.
pub fn tracing_subscribe_boilerplate(env_min: impl Into<String>) {
    let env_min = env_min.into();
    let filter = std::env::var("RUST_LOG").ok()
                                          .and_then(|directive| EnvFilter::try_new(directive).ok())
                                          .unwrap_or_else(|| EnvFilter::new(&env_min));

    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_file(true)
                             .with_line_number(true)
                             .with_target(true)
                             .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_filter(0), "info");
        assert_eq!(verbosity_filter(1), "debug");
        assert_eq!(verbosity_filter(2), "debug,numincrement=trace");
        assert_eq!(verbosity_filter(7), "debug,numincrement=trace");
    }

    #[test]
    fn verbosity_filters_parse() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(verbosity_filter(v)).is_ok());
        }
    }
}
