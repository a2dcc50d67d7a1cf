//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `TAPE_INTERACT_DEBUG=1` selects debug
//! output and the default is warnings only. Raw mode owns the terminal, so
//! events go to `TAPE_INTERACT_LOG` when configured and stderr otherwise.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

fn default_level(config: &EnvConfig) -> &'static str {
    if config.debug {
        "tape_interact=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Returns `false` when one was already
/// installed; the caller's run continues either way.
pub fn init_logging(config: &EnvConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(config)));

    let (writer, ansi) = match config.log_file.as_deref() {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
            Err(err) => {
                eprintln!("Warning: failed to open log file {path}: {err}");
                (BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal())
            }
        },
        None => (BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{default_level, init_logging};
    use crate::config::EnvConfig;

    #[test]
    fn debug_flag_raises_default_level() {
        let mut config = EnvConfig::default();
        assert_eq!(default_level(&config), "warn");
        config.debug = true;
        assert_eq!(default_level(&config), "tape_interact=debug");
    }

    #[test]
    fn second_initialisation_is_harmless() {
        let config = EnvConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
