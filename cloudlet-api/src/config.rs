use cloudlet_orchestrator::placement::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS};
use cloudlet_orchestrator::port_forward::HANDOFF_PORT;
use cloudlet_orchestrator::PlacementPolicy;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,

    #[serde(default = "default_placement_interval")]
    pub placement_interval_ms: u64,

    #[serde(default = "default_placement_attempts")]
    pub placement_max_attempts: u32,

    #[serde(default = "default_handoff_port")]
    pub handoff_port: u16,
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

fn default_bind_addr() -> String {
    std::env::var("CLOUDLET_API_BIND").unwrap_or_else(|_| "0.0.0.0:8774".to_string())
}

fn default_backend_url() -> String {
    std::env::var("CLOUDLET_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:8775".to_string())
}

fn default_backend_timeout() -> u64 {
    env_or("CLOUDLET_BACKEND_TIMEOUT_SECS", 30)
}

fn default_placement_interval() -> u64 {
    env_or("CLOUDLET_PLACEMENT_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)
}

fn default_placement_attempts() -> u32 {
    env_or("CLOUDLET_PLACEMENT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)
}

fn default_handoff_port() -> u16 {
    env_or("CLOUDLET_HANDOFF_PORT", HANDOFF_PORT)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            backend_url: default_backend_url(),
            backend_timeout_secs: default_backend_timeout(),
            placement_interval_ms: default_placement_interval(),
            placement_max_attempts: default_placement_attempts(),
            handoff_port: default_handoff_port(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn placement_policy(&self) -> PlacementPolicy {
        PlacementPolicy {
            interval: Duration::from_millis(self.placement_interval_ms),
            max_attempts: self.placement_max_attempts,
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}
