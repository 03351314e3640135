use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

mod error;
pub mod watcher;

use crate::audit::AuditFilter;
pub use error::Error;

#[derive(Clone, Debug, Deserialize)]
pub struct Configuration {
    pub server: ServerConfig,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    #[serde(default = "ServerConfig::default_query_timeout")]
    pub query_timeout: u64,
    #[serde(default = "ServerConfig::default_query_timeout_grace_period")]
    pub query_timeout_grace_period: u64,
    pub tls: Option<ServerTlsConfig>,
}

impl ServerConfig {
    fn default_port() -> u16 {
        8000
    }

    fn default_query_timeout() -> u64 {
        3600
    }

    fn default_query_timeout_grace_period() -> u64 {
        60
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServerTlsConfig {
    pub server_certificate_bundle: String,
    pub server_private_key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "GlobalConfig::default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            max_concurrent_requests: GlobalConfig::default_max_concurrent_requests(),
        }
    }
}

impl GlobalConfig {
    fn default_max_concurrent_requests() -> usize {
        4
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuditConfig {
    #[serde(default = "AuditConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "AuditConfig::default_excluded_paths")]
    pub excluded_paths: Vec<String>,
    #[serde(default = "AuditConfig::default_user_header")]
    pub user_header: String,
    #[serde(default = "AuditConfig::default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            enabled: AuditConfig::default_enabled(),
            excluded_paths: AuditConfig::default_excluded_paths(),
            user_header: AuditConfig::default_user_header(),
            max_body_size: AuditConfig::default_max_body_size(),
        }
    }
}

impl AuditConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_excluded_paths() -> Vec<String> {
        AuditFilter::DEFAULT_EXCLUDED_PATHS
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn default_user_header() -> String {
        "X-MS-CLIENT-PRINCIPAL-NAME".to_string()
    }

    fn default_max_body_size() -> usize {
        1024 * 1024
    }

    pub fn build_filter(&self) -> Result<AuditFilter, Error> {
        Ok(AuditFilter::new(self.enabled, &self.excluded_paths)?)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TracingConfig {
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        let config: Configuration = toml::from_str(slice).map_err(|e| {
            println!("Configuration file format error:");
            println!("{e}");
            Error::ConfigurationFileFormat(e.to_string())
        })?;

        config.audit.build_filter()?;

        if config.global.max_concurrent_requests == 0 {
            return Err(Error::ConfigurationFileFormat(
                "global.max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        if config.audit.user_header.trim().is_empty() {
            return Err(Error::ConfigurationFileFormat(
                "audit.user_header cannot be empty".to_string(),
            ));
        }

        Ok(config)
    }
}
