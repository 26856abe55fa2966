//! Keeper configuration.
//!
//! Tunables (candidate bounds, gas strategy, submission timing) load from an
//! optional TOML file named by `KEEPER_CONFIG`, falling back to built-in
//! defaults. Endpoint and account material stay in the environment and are
//! handled by the binary.

use keeper_chain::{FixedGasPrice, GasPricer, IncreasingGasPrice, GWEI};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// Keeper tunables, immutable after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    /// Max candidates to pull from the index (indexed mode).
    #[serde(default = "default_top")]
    pub top: usize,

    /// Cups per batched bite transaction (indexed mode).
    #[serde(default = "default_chunks")]
    pub chunks: usize,

    /// JSON-RPC request timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Give up on a single transaction after this many seconds.
    #[serde(default = "default_submit_deadline_secs")]
    pub submit_deadline_secs: u64,

    /// Gas pricing strategy.
    #[serde(default)]
    pub gas: GasConfig,
}

fn default_top() -> usize {
    500
}
fn default_chunks() -> usize {
    100
}
fn default_rpc_timeout_secs() -> u64 {
    10
}
fn default_submit_deadline_secs() -> u64 {
    3600
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            top: default_top(),
            chunks: default_chunks(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            submit_deadline_secs: default_submit_deadline_secs(),
            gas: GasConfig::default(),
        }
    }
}

/// Gas strategy selection and parameters, gwei-denominated.
#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// "increasing" (default) or "fixed".
    #[serde(default = "default_gas_mode")]
    pub mode: String,

    /// Fixed mode: the constant price.
    /// Increasing mode: price of the first attempt.
    #[serde(default = "default_initial_gwei")]
    pub initial_price_gwei: u64,

    /// Increasing mode: step per interval.
    #[serde(default = "default_increase_gwei")]
    pub increase_by_gwei: u64,

    /// Increasing mode: interval length in seconds. Doubles as the
    /// rebroadcast wait, so each rebroadcast lands on a fresh price step.
    #[serde(default = "default_every_secs")]
    pub every_secs: u64,

    /// Increasing mode: hard cap.
    #[serde(default = "default_max_gwei")]
    pub max_price_gwei: u64,
}

fn default_gas_mode() -> String {
    "increasing".to_string()
}
fn default_initial_gwei() -> u64 {
    5
}
fn default_increase_gwei() -> u64 {
    10
}
fn default_every_secs() -> u64 {
    60
}
fn default_max_gwei() -> u64 {
    300
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            mode: default_gas_mode(),
            initial_price_gwei: default_initial_gwei(),
            increase_by_gwei: default_increase_gwei(),
            every_secs: default_every_secs(),
            max_price_gwei: default_max_gwei(),
        }
    }
}

impl GasConfig {
    /// Build the pricer this configuration describes.
    pub fn build_pricer(&self) -> Box<dyn GasPricer> {
        match self.mode.to_lowercase().as_str() {
            "fixed" => Box::new(FixedGasPrice::new(self.initial_price_gwei as u128 * GWEI)),
            _ => Box::new(IncreasingGasPrice::new(
                self.initial_price_gwei as u128 * GWEI,
                self.increase_by_gwei as u128 * GWEI,
                self.every_secs,
                self.max_price_gwei as u128 * GWEI,
            )),
        }
    }
}

impl KeeperConfig {
    /// Load from the file named by `KEEPER_CONFIG`, or defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("KEEPER_CONFIG") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Rebroadcast wait derived from the gas interval.
    pub fn rebroadcast_interval(&self) -> Duration {
        Duration::from_secs(self.gas.every_secs.max(1))
    }

    pub fn submit_deadline(&self) -> Duration {
        Duration::from_secs(self.submit_deadline_secs)
    }

    /// Log the loaded configuration.
    pub fn log_config(&self) {
        info!(
            top = self.top,
            chunks = self.chunks,
            rpc_timeout_secs = self.rpc_timeout_secs,
            "Keeper configuration loaded"
        );
        info!(
            mode = %self.gas.mode,
            initial_gwei = self.gas.initial_price_gwei,
            increase_by_gwei = self.gas.increase_by_gwei,
            every_secs = self.gas.every_secs,
            max_gwei = self.gas.max_price_gwei,
            "Gas strategy"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_values() {
        let config = KeeperConfig::default();
        assert_eq!(config.top, 500);
        assert_eq!(config.chunks, 100);
        assert_eq!(config.rpc_timeout_secs, 10);
        assert_eq!(config.gas.mode, "increasing");
    }

    #[test]
    fn test_default_gas_schedule() {
        let pricer = GasConfig::default().build_pricer();
        assert_eq!(pricer.name(), "increasing");
        assert_eq!(pricer.price_at(Duration::ZERO), 5 * GWEI);
        assert_eq!(pricer.price_at(Duration::from_secs(65)), 15 * GWEI);
        assert_eq!(pricer.price_at(Duration::from_secs(1800)), 300 * GWEI);
    }

    #[test]
    fn test_fixed_mode() {
        let gas = GasConfig {
            mode: "fixed".to_string(),
            initial_price_gwei: 129,
            ..GasConfig::default()
        };
        let pricer = gas.build_pricer();
        assert_eq!(pricer.name(), "fixed");
        assert_eq!(pricer.price_at(Duration::from_secs(999)), 129 * GWEI);
    }

    #[test]
    fn test_toml_overrides() {
        let config: KeeperConfig = toml::from_str(
            r#"
            top = 250
            [gas]
            mode = "fixed"
            initial_price_gwei = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.top, 250);
        assert_eq!(config.chunks, 100);
        assert_eq!(config.gas.mode, "fixed");
        assert_eq!(config.gas.initial_price_gwei, 40);
    }

    #[test]
    fn test_rebroadcast_interval_never_zero() {
        let config: KeeperConfig = toml::from_str("[gas]\nevery_secs = 0\n").unwrap();
        assert_eq!(config.rebroadcast_interval(), Duration::from_secs(1));
    }
}
