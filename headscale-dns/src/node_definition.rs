use crate::ConfigError;
use std::net::{Ipv4Addr, Ipv6Addr};
use trust_dns_resolver::Name;

/// The addresses every published hostname points at.
///
/// An `A` record is rendered for the IPv4 address, and an `AAAA` record
/// for the IPv6 address when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress {
    ipv4: Ipv4Addr,
    ipv6: Option<Ipv6Addr>,
}

impl NodeAddress {
    /// Create a [`NodeAddress`] with a mandatory IPv4 and an optional IPv6 address.
    pub fn new(ipv4: Ipv4Addr, ipv6: Option<Ipv6Addr>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Get the IPv4 address.
    pub fn ipv4(&self) -> Ipv4Addr {
        self.ipv4
    }

    /// Get the IPv6 address, if any.
    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6
    }
}

impl std::fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ipv6 {
            Some(ipv6) => write!(f, "{}/{}", self.ipv4, ipv6),
            None => write!(f, "{}", self.ipv4),
        }
    }
}

/// Defines the node that published hostnames live under, with a `hostname`,
/// a `base_domain` and the [`NodeAddress`] records point at.
///
/// Every subdomain is published as `<subdomain>.<hostname>.<base_domain>`.
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    /// The node hostname, e.g. `node1`.
    hostname: String,
    /// The tailnet base domain, e.g. `ts.net`.
    base_domain: String,
    /// `<hostname>.<base_domain>`.
    fqdn: String,
    address: NodeAddress,
}

impl NodeDefinition {
    /// Create a [`NodeDefinition`] from its parts.
    ///
    /// This function will fail if `<hostname>.<base_domain>` is not a valid domain name.
    pub fn from_parts<H: ToString, B: ToString>(
        hostname: H,
        base_domain: B,
        address: NodeAddress,
    ) -> Result<Self, ConfigError> {
        let hostname = hostname.to_string();
        let base_domain = base_domain.to_string();
        let fqdn = format!("{}.{}", hostname, base_domain);

        if hostname.is_empty() || base_domain.is_empty() {
            return Err(ConfigError::InvalidNodeDomain {
                domain: fqdn,
                reason: "hostname and base domain must not be empty".to_string(),
            });
        }

        Name::from_ascii(&fqdn).map_err(|err| ConfigError::InvalidNodeDomain {
            domain: fqdn.clone(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            hostname,
            base_domain,
            fqdn,
            address,
        })
    }

    /// Get the `hostname` part of a `NodeDefinition`.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the `base_domain` part of a `NodeDefinition`.
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Get the fully qualified node domain, `<hostname>.<base_domain>`.
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Get the [`NodeAddress`] of the node.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }
}

/// ```
/// use std::net::Ipv4Addr;
/// use headscale_dns::{NodeAddress, NodeDefinition};
///
/// let address = NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None);
/// let node = NodeDefinition::try_from(("node1", "ts.net", address)).unwrap();
/// assert_eq!(node.fqdn(), "node1.ts.net");
/// ```
impl TryFrom<(&str, &str, NodeAddress)> for NodeDefinition {
    type Error = ConfigError;

    fn try_from(
        (hostname, base_domain, address): (&str, &str, NodeAddress),
    ) -> Result<Self, Self::Error> {
        Self::from_parts(hostname, base_domain, address)
    }
}
