use onos_sync_gateway::GatewayConfig;
use onos_sync_reconciler::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Sync loop pacing and failure backoff
    #[serde(default)]
    pub sync: SyncConfig,
    /// Outbound calls to ONOS controllers
    #[serde(default)]
    pub gateway: GatewaySettings,
    /// Local config files written for `config_*` attributes
    #[serde(default)]
    pub files: FilesConfig,
    /// Records loaded into the store at startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Sync validations
        if self.sync.poll_interval_ms == 0 {
            return Err("sync.poll_interval_ms must be > 0".into());
        }
        if self.sync.retry_base_secs == 0 {
            return Err("sync.retry_base_secs must be > 0".into());
        }
        if self.sync.retry_base_secs > self.sync.retry_max_secs {
            return Err("sync.retry_base_secs must be <= sync.retry_max_secs".into());
        }
        if self.gateway.request_timeout_ms == 0 {
            return Err("gateway.request_timeout_ms must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.bootstrap.caller.trim().is_empty() {
            return Err("bootstrap.caller must not be empty".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_secs(self.sync.retry_base_secs),
            max: Duration::from_secs(self.sync.retry_max_secs),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            request_timeout: Duration::from_millis(self.gateway.request_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay after the first failure, doubled on every further failure
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: u64,
    #[serde(default = "default_retry_max_secs")]
    pub retry_max_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}
fn default_retry_base_secs() -> u64 {
    60
}
fn default_retry_max_secs() -> u64 {
    3_600
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_base_secs: default_retry_base_secs(),
            retry_max_secs: default_retry_max_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Local file output. Without a directory `config_*` attributes are acknowledged
/// without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilesConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Identity recorded as the creator of bootstrapped records.
    #[serde(default = "default_caller")]
    pub caller: String,
    /// JSON or TOML snapshot of services, apps and attributes.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

fn default_caller() -> String {
    "onos-sync".into()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            caller: default_caller(),
            snapshot: None,
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "onos-sync.toml";
    pub const ENV_PREFIX: &str = "ONOS_SYNC";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., ONOS_SYNC__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
