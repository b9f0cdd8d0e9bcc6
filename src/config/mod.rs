//! Layered process configuration.
//!
//! Assembled once at startup with `figment` (TOML file, overridden by
//! `RCA_*` environment variables) and never mutated afterward, per §9
//! ("Global state ... immutable after startup; they do not require
//! synchronization"). `RcaConfig` mirrors the configuration table from the
//! external-interfaces contract field for field; every default here matches
//! the default named there.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{RcaError, Result};
use crate::rca::{TenantEntry, TenantRegistry};
use crate::storage::DatabaseConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// z-score cutoff for "significant" severity.
    pub threshold_sigma: f64,
    /// Minimum ad count for a metric baseline to be `sufficient`.
    pub min_sample_size: usize,
    /// Spend floor, in dollars, below which an ad is excluded from detection.
    pub min_spend: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold_sigma: 2.0,
            min_sample_size: 10,
            min_spend: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcaLoopConfig {
    /// Per-anomaly probe-invocation cap.
    pub max_steps: u32,
    /// Parallel anomalies diagnosed at once within a session.
    pub concurrency: usize,
}

impl Default for RcaLoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which model backend to target. `"deterministic"` runs the rule-based
    /// fallback client with no external calls, useful offline and in tests.
    pub provider: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "deterministic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Retry-with-feedback cap before falling back to deterministic output.
    pub retry_max: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { retry_max: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLifecycleConfig {
    /// Idle session lifetime, in seconds.
    pub ttl_seconds: u64,
}

impl Default for SessionLifecycleConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-probe deadline, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Every option named in the external-interfaces configuration table,
/// grouped the way the table's dotted keys (`anomaly.threshold_sigma`,
/// `rca.max_steps`, ...) imply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcaConfig {
    pub anomaly: AnomalyConfig,
    pub rca: RcaLoopConfig,
    pub model: ModelConfig,
    pub validator: ValidatorConfig,
    pub session: SessionLifecycleConfig,
    pub probe: ProbeConfig,
}

impl RcaConfig {
    /// Loads defaults, then a TOML file if present, then `RCA_*` environment
    /// overrides (e.g. `RCA_ANOMALY.THRESHOLD_SIGMA=2.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(RcaConfig::default()));
        if let Some(p) = path {
            figment = figment.merge(Toml::file(p));
        }
        figment = figment.merge(Env::prefixed("RCA_").split("__"));
        figment
            .extract()
            .map_err(|e| RcaError::Config(format!("failed to load configuration: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// One entry of the process-wide tenant registry as it appears in the
/// configuration file (`[[tenants]]` tables).
pub type TenantConfigEntry = TenantEntry;

/// The full process configuration: the RCA core's own settings, the
/// warehouse connection, the HTTP surface, ambient observability, and the
/// tenant registry. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rca: RcaConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub observability: crate::observability::ObservabilityConfig,
    #[serde(default)]
    pub tenants: Vec<TenantConfigEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rca: RcaConfig::default(),
            database: DatabaseConfig::default(),
            api: ApiConfig::default(),
            observability: crate::observability::ObservabilityConfig::default(),
            tenants: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn tenant_registry(&self) -> TenantRegistry {
        TenantRegistry::from_entries(self.tenants.clone())
    }

    /// Loads defaults, then a TOML file if present, then `RCA_*` environment
    /// overrides, the same layering `RcaConfig::load` uses for its own
    /// sub-tree — this is the whole-process superset, tenant allowlist
    /// included.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(p) = path {
            figment = figment.merge(Toml::file(p));
        }
        figment = figment.merge(Env::prefixed("RCA_").split("__"));
        figment
            .extract()
            .map_err(|e| RcaError::Config(format!("failed to load configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_configuration_table() {
        let config = RcaConfig::default();
        assert_eq!(config.anomaly.threshold_sigma, 2.0);
        assert_eq!(config.anomaly.min_sample_size, 10);
        assert_eq!(config.rca.max_steps, 6);
        assert_eq!(config.rca.concurrency, 4);
        assert_eq!(config.validator.retry_max, 2);
        assert_eq!(config.session.ttl_seconds, 3600);
        assert_eq!(config.probe.timeout_ms, 10_000);
    }

    #[test]
    fn tenant_registry_built_from_config() {
        let mut config = Config::default();
        config.tenants.push(TenantConfigEntry {
            short_code: "acme".to_string(),
            warehouse_view_id: "view_acme".to_string(),
        });
        let registry = config.tenant_registry();
        assert!(registry.resolve("acme").is_ok());
    }
}
