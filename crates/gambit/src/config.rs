//! Server configuration, from defaults or the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use gambit_tick::TickConfig;

/// Environment variable holding the listen address.
pub const BIND_ENV: &str = "GAMBIT_BIND";

/// Environment variable holding the sweep interval in milliseconds.
pub const SWEEP_INTERVAL_ENV: &str = "GAMBIT_SWEEP_INTERVAL_MS";

/// Where to listen and how often to sweep.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// Schedule for the periodic state sweep.
    pub sweep: TickConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            sweep: TickConfig::with_interval(Duration::from_secs(1)),
        }
    }
}

impl ServerConfig {
    /// Reads `GAMBIT_BIND` and `GAMBIT_SWEEP_INTERVAL_MS`, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = read::<String>(&lookup, BIND_ENV) {
            config.bind_addr = addr;
        }
        if let Some(ms) = read::<u64>(&lookup, SWEEP_INTERVAL_ENV) {
            config.sweep =
                TickConfig::with_interval(Duration::from_millis(ms)).validated();
        }

        config
    }
}

fn read<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
