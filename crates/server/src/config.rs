use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use orchestrator_core::CoreConfig;

/// Process settings read from the environment (and `.env`, if present).
///
/// Collaborator credentials are read by the adapters themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub transit_city: String,
    pub call_timeout: Duration,
    pub session_idle: Duration,
    pub session_sweep: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: var_or("HOST", "0.0.0.0")?,
            port: var_or("PORT", "8000")?,
            transit_city: env::var("TRANSIT_CITY")
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "深圳".to_string()),
            call_timeout: Duration::from_secs(var_or("CALL_TIMEOUT_SECS", "30")?),
            session_idle: Duration::from_secs(var_or("SESSION_IDLE_SECS", "7200")?),
            session_sweep: Duration::from_secs(var_or("SESSION_SWEEP_SECS", "300")?),
        };
        ensure!(!config.call_timeout.is_zero(), "CALL_TIMEOUT_SECS must be positive");
        ensure!(!config.session_sweep.is_zero(), "SESSION_SWEEP_SECS must be positive");
        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn core(&self) -> CoreConfig {
        CoreConfig {
            transit_city: self.transit_city.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

fn var_or<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse().with_context(|| format!("invalid {}: {:?}", name, raw))
}
