//! Configuration for headscale-dns, read from `HEADSCALE_DNS_*` environment variables.

use crate::{ConfigError, FailurePolicy, NodeAddress, NodeDefinition, DEFAULT_LABEL_KEY};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use tokio::time::Duration;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "HEADSCALE_DNS";

const LABEL_KEY_VAR: &str = "HEADSCALE_DNS_LABEL_KEY";
const JSON_PATH_VAR: &str = "HEADSCALE_DNS_JSON_PATH";
const REFRESH_SECONDS_VAR: &str = "HEADSCALE_DNS_REFRESH_SECONDS";
const NODE_HOSTNAME_VAR: &str = "HEADSCALE_DNS_NODE_HOSTNAME";
const NODE_IP_VAR: &str = "HEADSCALE_DNS_NODE_IP";
const NODE_IP6_VAR: &str = "HEADSCALE_DNS_NODE_IP6";
const EXIT_ON_ERROR_VAR: &str = "HEADSCALE_DNS_EXIT_ON_ERROR";

/// Default base domain of the tailnet.
pub const DEFAULT_BASE_DOMAIN: &str = "ts.net";

/// Default time between two sync passes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

fn default_log_level() -> String {
    "info".to_string()
}

/// The variables as found in the environment, before validation.
///
/// Every field is optional here; [`Config::try_from`] applies the defaults
/// and rejects missing or malformed values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentConfig {
    /// `HEADSCALE_DNS_LABEL_KEY`
    #[serde(default)]
    pub label_key: Option<String>,
    /// `HEADSCALE_DNS_JSON_PATH`
    #[serde(default)]
    pub json_path: Option<String>,
    /// `HEADSCALE_DNS_REFRESH_SECONDS`
    #[serde(default)]
    pub refresh_seconds: Option<String>,
    /// `HEADSCALE_DNS_BASE_DOMAIN`
    #[serde(default)]
    pub base_domain: Option<String>,
    /// `HEADSCALE_DNS_NODE_HOSTNAME`
    #[serde(default)]
    pub node_hostname: Option<String>,
    /// `HEADSCALE_DNS_NODE_IP`
    #[serde(default)]
    pub node_ip: Option<String>,
    /// `HEADSCALE_DNS_NODE_IP6`
    #[serde(default)]
    pub node_ip6: Option<String>,
    /// `HEADSCALE_DNS_EXIT_ON_ERROR`
    #[serde(default)]
    pub exit_on_error: Option<String>,
    /// `HEADSCALE_DNS_LOG_LEVEL`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl EnvironmentConfig {
    /// Read the variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Read the variables from `vars` instead of the process environment.
    ///
    /// Keys are full variable names, e.g. `HEADSCALE_DNS_NODE_IP`.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let config = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).source(vars))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Container label holding the requested subdomains.
    pub label_key: String,
    /// Where the records file is written.
    pub json_path: PathBuf,
    /// Time between two sync passes.
    pub refresh_interval: Duration,
    /// The node records point at.
    pub node: NodeDefinition,
    /// What to do when a sync pass fails.
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Read and validate the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        EnvironmentConfig::from_env()?.try_into()
    }

    /// Log the effective settings.
    pub fn log_settings(&self) {
        let address = self.node.address();

        tracing::info!(
            label_key = %self.label_key,
            json_path = %self.json_path.display(),
            base_domain = %self.node.base_domain(),
            node_hostname = %self.node.hostname(),
            node_ipv4 = %address.ipv4(),
            node_ipv6 = %display_optional(address.ipv6()),
            refresh_interval_secs = self.refresh_interval.as_secs(),
            failure_policy = ?self.failure_policy,
            "using settings"
        );
        tracing::info!(
            "example: service.{} -> {}",
            self.node.fqdn(),
            address
        );

        if address.ipv6().is_none() {
            tracing::warn!(
                "{} is not set, AAAA records will not be created",
                NODE_IP6_VAR
            );
        }
    }
}

impl TryFrom<EnvironmentConfig> for Config {
    type Error = ConfigError;

    fn try_from(env: EnvironmentConfig) -> Result<Self, Self::Error> {
        let label_key = non_empty(env.label_key).unwrap_or_else(|| DEFAULT_LABEL_KEY.to_string());

        let json_path = non_empty(env.json_path)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(JSON_PATH_VAR))?;

        let refresh_interval = match non_empty(env.refresh_seconds) {
            Some(value) => parse_refresh_interval(value)?,
            None => DEFAULT_REFRESH_INTERVAL,
        };

        let base_domain =
            non_empty(env.base_domain).unwrap_or_else(|| DEFAULT_BASE_DOMAIN.to_string());

        let node_hostname =
            non_empty(env.node_hostname).ok_or(ConfigError::Missing(NODE_HOSTNAME_VAR))?;

        let ipv4 = non_empty(env.node_ip)
            .ok_or(ConfigError::Missing(NODE_IP_VAR))
            .and_then(parse_ipv4)?;

        let ipv6 = non_empty(env.node_ip6).map(parse_ipv6).transpose()?;

        let node = NodeDefinition::from_parts(
            node_hostname,
            base_domain,
            NodeAddress::new(ipv4, ipv6),
        )?;

        let exit_on_error = match non_empty(env.exit_on_error) {
            Some(value) => parse_flag(EXIT_ON_ERROR_VAR, value)?,
            None => false,
        };
        let failure_policy = if exit_on_error {
            FailurePolicy::Exit
        } else {
            FailurePolicy::SkipCycle
        };

        Ok(Self {
            label_key,
            json_path,
            refresh_interval,
            node,
            failure_policy,
        })
    }
}

fn display_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_refresh_interval(value: String) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidRefreshInterval {
            var: REFRESH_SECONDS_VAR,
            value,
        }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { var, value }),
    }
}

/// Accepts plain IPv4 and IPv4-mapped IPv6 (`::ffff:100.64.0.1`) addresses.
fn parse_ipv4(value: String) -> Result<Ipv4Addr, ConfigError> {
    match value.parse::<IpAddr>().map(|ip| ip.to_canonical()) {
        Ok(IpAddr::V4(ipv4)) => Ok(ipv4),
        _ => Err(ConfigError::InvalidIpv4 {
            var: NODE_IP_VAR,
            value,
        }),
    }
}

fn parse_ipv6(value: String) -> Result<Ipv6Addr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidIpv6 {
        var: NODE_IP6_VAR,
        value,
    })
}
