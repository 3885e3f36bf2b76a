// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Datacenter (region) all load balancers live in.
    pub datacenter: String,
    pub debug: bool,
    pub control_plane: ControlPlaneConfig,
    pub policy: PolicyConfig,
    pub convergence: ConvergenceConfig,
    pub directory: DirectoryConfig,
    pub reconciler: ReconcilerConfig,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datacenter: "GB3".to_string(),
            debug: false,
            control_plane: ControlPlaneConfig::default(),
            policy: PolicyConfig::default(),
            convergence: ConvergenceConfig::default(),
            directory: DirectoryConfig::default(),
            reconciler: ReconcilerConfig::default(),
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.datacenter.trim().is_empty() {
            bail!("datacenter must not be empty");
        }
        if self.policy.allowed_ports.is_empty() {
            bail!("policy.allowed_ports must list at least one port");
        }
        if self.policy.allowed_ports.contains(&0) {
            bail!("policy.allowed_ports must not contain port 0");
        }
        if self.policy.opt_in_attribute.trim().is_empty() {
            bail!("policy.opt_in_attribute must not be empty");
        }
        if self.convergence.initial_delay_ms == 0 {
            bail!("convergence.initial_delay_ms must be greater than zero");
        }
        if self.convergence.max_delay_ms < self.convergence.initial_delay_ms {
            bail!("convergence.max_delay_ms must be >= convergence.initial_delay_ms");
        }
        if self.convergence.timeout_ms < self.convergence.initial_delay_ms {
            bail!("convergence.timeout_ms must be >= convergence.initial_delay_ms");
        }
        if self.directory.max_depth == 0 || self.directory.max_groups == 0 {
            bail!("directory limits must be greater than zero");
        }
        Ok(())
    }

    /// Default tracing directive for this crate.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "lb_registrator=debug"
        } else {
            "lb_registrator=info"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Overrides the alias returned by login.
    pub account_alias: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub pool_method: String,
    pub pool_persistence: String,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.ctl.io/").expect("static url"),
            user_agent: "Registrator/Clc-Provider".to_string(),
            timeout_secs: 30,
            account_alias: None,
            username: None,
            password: None,
            pool_method: "roundRobin".to_string(),
            pool_persistence: "standard".to_string(),
        }
    }
}

impl ControlPlaneConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub opt_in_attribute: String,
    pub allowed_ports: Vec<u16>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            opt_in_attribute: "clc".to_string(),
            allowed_ports: vec![80, 443],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 200,
            max_delay_ms: 1000,
            timeout_ms: 10_000,
        }
    }
}

impl ConvergenceConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub max_depth: usize,
    pub max_groups: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_groups: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Serialize reconciliations of the same service within this process.
    pub serialize_per_service: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            serialize_per_service: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ([0, 0, 0, 0], 8080).into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}
