//! # Logging
//!
//! `git-cmd` logs to a file so command output stays clean. `GIT_CMD_LOG`
//! takes `EnvFilter` directives and wins over the configured level.

use std::fs::OpenOptions;
use std::sync::Mutex;

use commander_core::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives
pub const LOG_ENV: &str = "GIT_CMD_LOG";

fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Falls back to warnings on stderr when
/// the log file cannot be opened.
pub fn init_logging(config: &LogConfig) {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file);

    let installed = match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter(config))
            .without_time()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("warn"))
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("A tracing subscriber was already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LogConfig {
            file: "/tmp/unused.log".into(),
            level: "not a [valid directive".into(),
        };
        let filter = filter(&config);
        assert!(!filter.to_string().is_empty());
    }
}
