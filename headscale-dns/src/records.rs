//! Renders subdomains into the DNS records headscale loads from its
//! `extra_records_path` file.
//!
//! Headscale checksums that file to detect changes, so the rendered output
//! must be byte-for-byte stable for the same set of subdomains: records are
//! sorted by name and then by type before serialization, regardless of the
//! order containers were discovered in.

use crate::{extract_subdomains, ContainerDescriptor, NodeAddress, NodeDefinition};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;

/// The kind of address a [`DnsRecord`] resolves to.
///
/// Variants are ordered the same way their names sort, `A` before `AAAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecordType {
    /// IPv4 address record.
    #[serde(rename = "A")]
    A,
    /// IPv6 address record.
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// The record type as it appears in the records file.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of the records file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DnsRecord {
    /// Fully qualified hostname, `<subdomain>.<node fqdn>`.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Address the name resolves to.
    pub value: IpAddr,
}

impl DnsRecord {
    fn new(subdomain: &str, node_fqdn: &str, record_type: RecordType, value: IpAddr) -> Self {
        Self {
            name: format!("{}.{}", subdomain, node_fqdn),
            record_type,
            value,
        }
    }

    /// Compare two records by name, then by type.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.record_type.cmp(&other.record_type))
    }
}

/// Render the records for `subdomains` under `node_fqdn`.
///
/// Each subdomain gets an `A` record and, when `address` has an IPv6 address,
/// an `AAAA` record. Records come out in subdomain order; use [`canonicalize`]
/// before serializing.
pub fn render<S: AsRef<str>>(
    subdomains: &[S],
    node_fqdn: &str,
    address: &NodeAddress,
) -> Vec<DnsRecord> {
    let per_subdomain = if address.ipv6().is_some() { 2 } else { 1 };
    let mut records = Vec::with_capacity(subdomains.len() * per_subdomain);

    for subdomain in subdomains {
        let subdomain = subdomain.as_ref();

        records.push(DnsRecord::new(
            subdomain,
            node_fqdn,
            RecordType::A,
            address.ipv4().into(),
        ));

        if let Some(ipv6) = address.ipv6() {
            records.push(DnsRecord::new(
                subdomain,
                node_fqdn,
                RecordType::Aaaa,
                ipv6.into(),
            ));
        }
    }

    records
}

/// Sort records by name, then by type.
///
/// The sort is stable, so records with equal name and type keep their
/// relative order and the result only depends on the input.
pub fn canonicalize(mut records: Vec<DnsRecord>) -> Vec<DnsRecord> {
    records.sort_by(DnsRecord::canonical_cmp);
    records
}

/// Serialize records as a pretty printed JSON array, indented with two spaces.
pub fn serialize(records: &[DnsRecord]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(records)
}

/// Run the whole pipeline: extract the subdomains requested by `containers`,
/// render them for `node`, sort and serialize them.
///
/// ```
/// use std::net::Ipv4Addr;
/// use headscale_dns::{render_records, ContainerDescriptor, NodeAddress, NodeDefinition};
///
/// let node = NodeDefinition::from_parts(
///     "node1",
///     "ts.net",
///     NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None),
/// )
/// .unwrap();
/// let containers = vec![
///     ContainerDescriptor::default().with_label("headscale.dns.subdomain", "app"),
/// ];
///
/// let rendered = render_records(&containers, "headscale.dns.subdomain", &node).unwrap();
/// assert_eq!(rendered.records.len(), 1);
/// assert_eq!(rendered.records[0].name, "app.node1.ts.net");
/// ```
pub fn render_records<'a, I>(
    containers: I,
    label_key: &str,
    node: &NodeDefinition,
) -> Result<RenderedRecords, serde_json::Error>
where
    I: IntoIterator<Item = &'a ContainerDescriptor>,
{
    let subdomains = extract_subdomains(containers, label_key);
    let records = canonicalize(render(&subdomains, node.fqdn(), node.address()));
    let bytes = serialize(&records)?;

    Ok(RenderedRecords {
        subdomains,
        records,
        bytes,
    })
}

/// Output of [`render_records`].
#[derive(Debug, Clone)]
pub struct RenderedRecords {
    /// Subdomains extracted from the container labels, in discovery order.
    pub subdomains: Vec<String>,
    /// Records in canonical order.
    pub records: Vec<DnsRecord>,
    /// The serialized records file.
    pub bytes: Vec<u8>,
}
