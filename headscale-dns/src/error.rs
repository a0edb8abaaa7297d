//! Error types for headscale-dns.

use thiserror::Error;

/// Errors raised while loading and validating the [`Config`](crate::Config).
///
/// All of them are fatal: the process exits before any sync pass runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment could not be read into a configuration.
    #[error("failed to read configuration: {0}")]
    Source(#[from] ::config::ConfigError),

    /// A required variable is not set.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// The node IPv4 address could not be parsed.
    #[error("invalid IPv4 address provided in {var}: {value:?}")]
    InvalidIpv4 {
        /// Variable holding the value.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The node IPv6 address could not be parsed.
    #[error("invalid IPv6 address provided in {var}: {value:?}")]
    InvalidIpv6 {
        /// Variable holding the value.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The refresh interval is not a positive number of seconds.
    #[error("invalid {var} value {value:?}: expected a positive number of seconds")]
    InvalidRefreshInterval {
        /// Variable holding the value.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// `<hostname>.<base domain>` is not a valid domain name.
    #[error("invalid node domain {domain:?}: {reason}")]
    InvalidNodeDomain {
        /// The rejected domain.
        domain: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A yes/no variable holds something else.
    #[error("invalid {var} value {value:?}: expected true or false")]
    InvalidFlag {
        /// Variable holding the value.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}
