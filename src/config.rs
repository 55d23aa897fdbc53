use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Vigil";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the HTTP bind address.
pub const BIND_ADDR_ENV: &str = "VIGIL_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "vigil=info,tower_http=warn"
}

/// Address the HTTP server binds to. Falls back to the default on a
/// missing or unparsable value.
pub fn bind_addr() -> SocketAddr {
    parse_bind_addr(std::env::var(BIND_ADDR_ENV).ok().as_deref())
}

fn parse_bind_addr(raw: Option<&str>) -> SocketAddr {
    let fallback = || {
        DEFAULT_BIND_ADDR
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000)))
    };
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value, "Invalid {}, using {}", BIND_ADDR_ENV, DEFAULT_BIND_ADDR);
            fallback()
        }),
        None => fallback(),
    }
}

/// Tunables for one triage pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Digital twin projection horizon.
    pub horizon_minutes: u32,
    /// Digital twin step interval.
    pub step_minutes: u32,
    /// Alternatives listed next to the recommended department.
    pub max_alternatives: usize,
    /// Classifier explanation factors kept in the result.
    pub max_explanation_factors: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            horizon_minutes: 180,
            step_minutes: 15,
            max_alternatives: 3,
            max_explanation_factors: 8,
        }
    }
}

impl TriageConfig {
    /// Number of timeline steps including minute 0.
    pub fn step_count(&self) -> usize {
        (self.horizon_minutes / self.step_minutes.max(1)) as usize + 1
    }
}
