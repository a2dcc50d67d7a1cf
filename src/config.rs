//! Environment configuration.

use std::env;

/// Consumers get this many ticks to acknowledge mounting before the hub
/// treats them as gone.
pub const DEFAULT_MOUNT_ACK_TICKS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub debug: bool,
    pub log_file: Option<String>,
    pub mount_ack_ticks: u32,
    pub raw_mode: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_file: None,
            mount_ack_ticks: DEFAULT_MOUNT_ACK_TICKS,
            raw_mode: true,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            debug: env_flag("TAPE_INTERACT_DEBUG"),
            log_file: env_string_opt("TAPE_INTERACT_LOG"),
            mount_ack_ticks: env_u32("TAPE_INTERACT_MOUNT_TICKS")
                .filter(|ticks| *ticks > 0)
                .unwrap_or(DEFAULT_MOUNT_ACK_TICKS),
            raw_mode: !env_flag("TAPE_INTERACT_NO_RAW"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_u32(key: &str) -> Option<u32> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{EnvConfig, DEFAULT_MOUNT_ACK_TICKS};
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 4] = [
        "TAPE_INTERACT_DEBUG",
        "TAPE_INTERACT_LOG",
        "TAPE_INTERACT_MOUNT_TICKS",
        "TAPE_INTERACT_NO_RAW",
    ];

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    fn cleared() -> Vec<EnvGuard> {
        KEYS.iter().map(|key| set_env_guard(key, None)).collect()
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let _lock = env_lock();
        let _guards = cleared();

        let config = EnvConfig::from_env();
        assert_eq!(config, EnvConfig::default());
        assert!(config.raw_mode);
        assert_eq!(config.mount_ack_ticks, DEFAULT_MOUNT_ACK_TICKS);
    }

    #[test]
    fn flags_and_values_are_read() {
        let _lock = env_lock();
        let _guards = cleared();
        let _g1 = set_env_guard("TAPE_INTERACT_DEBUG", Some("1"));
        let _g2 = set_env_guard("TAPE_INTERACT_LOG", Some("/tmp/interact.log"));
        let _g3 = set_env_guard("TAPE_INTERACT_MOUNT_TICKS", Some(" 7 "));
        let _g4 = set_env_guard("TAPE_INTERACT_NO_RAW", Some("1"));

        let config = EnvConfig::from_env();
        assert!(config.debug);
        assert_eq!(config.log_file.as_deref(), Some("/tmp/interact.log"));
        assert_eq!(config.mount_ack_ticks, 7);
        assert!(!config.raw_mode);
    }

    #[test]
    fn invalid_tick_counts_fall_back() {
        let _lock = env_lock();
        let _guards = cleared();
        for value in ["0", "soon", ""] {
            let _g = set_env_guard("TAPE_INTERACT_MOUNT_TICKS", Some(value));
            assert_eq!(EnvConfig::from_env().mount_ack_ticks, DEFAULT_MOUNT_ACK_TICKS);
        }
    }
}
