//! `headscale-dns` publishes hostnames declared by running containers as
//! [headscale](https://github.com/juanfont/headscale) extra DNS records.
//!
//! Containers opt in with a label listing the subdomains they want, separated
//! by `|`:
//!
//! ```text
//! headscale.dns.subdomain=web|api
//! ```
//!
//! Every subdomain is published under the node domain,
//! `<subdomain>.<node hostname>.<base domain>`, with an `A` record pointing at
//! the node IPv4 address and, when configured, an `AAAA` record pointing at
//! its IPv6 address. The records are written to the JSON file headscale reads
//! through its `extra_records_path` setting.
//!
//! # Simple example
//!
//! ```rust
//! use headscale_dns::{render_records, ContainerDescriptor, NodeAddress, NodeDefinition};
//! use std::net::Ipv4Addr;
//!
//! let node = NodeDefinition::from_parts(
//!     "node1",
//!     "ts.net",
//!     NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None),
//! )
//! .expect("invalid node domain");
//!
//! let containers = vec![
//!     ContainerDescriptor::new("c1", Default::default())
//!         .with_label("headscale.dns.subdomain", "app"),
//!     ContainerDescriptor::new("c2", Default::default())
//!         .with_label("headscale.dns.subdomain", "web|api"),
//! ];
//!
//! let rendered = render_records(&containers, "headscale.dns.subdomain", &node)
//!     .expect("failed to render records");
//!
//! let names: Vec<_> = rendered.records.iter().map(|r| r.name.as_str()).collect();
//! assert_eq!(names, ["api.node1.ts.net", "app.node1.ts.net", "web.node1.ts.net"]);
//! ```
//!
//! [`RecordSync`] keeps the file up to date: it renders it once on startup and
//! then on every refresh interval. It also allows plugging in a different
//! implementation of [`ContainerSource`].
//!
//! ```rust
//! use headscale_dns::{ContainerDescriptor, ContainerSource};
//!
//! // Nothing is ever running
//! struct EmptySource;
//!
//! #[async_trait::async_trait]
//! impl ContainerSource for EmptySource {
//!     async fn running_containers(&self) -> Result<Vec<ContainerDescriptor>, anyhow::Error> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     use headscale_dns::{NodeAddress, NodeDefinition, RecordSync};
//!     use std::net::Ipv4Addr;
//!
//!     let node = NodeDefinition::from_parts(
//!         "node1",
//!         "ts.net",
//!         NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None),
//!     )
//!     .unwrap();
//!     let dir = std::env::temp_dir().join("headscale-dns-doc");
//!     std::fs::create_dir_all(&dir).unwrap();
//!
//!     let record_sync = RecordSync::builder(node, dir.join("records.json"))
//!         .container_source(EmptySource)
//!         .build()
//!         .expect("failed to construct RecordSync");
//!
//!     let report = record_sync.sync_once().await.unwrap();
//!     assert_eq!(report.records, 0);
//!     assert_eq!(std::fs::read_to_string(dir.join("records.json")).unwrap(), "[]");
//! }
//! ```
//!
//! # Stability
//! Headscale checksums the records file to decide whether to reload it.
//! Records are therefore sorted by name and type before serialization, so
//! the file content only depends on the set of requested subdomains and not
//! on the order containers are listed in.

#![warn(missing_docs)]

pub mod config;
mod container_source;
mod docker_source;
mod error;
mod labels;
mod node_definition;
mod record_sync;
mod records;
pub mod telemetry;
mod ticker;
mod writer;

pub use crate::config::{Config, EnvironmentConfig, DEFAULT_BASE_DOMAIN, DEFAULT_REFRESH_INTERVAL};
pub use container_source::*;
pub use docker_source::*;
pub use error::*;
pub use labels::*;
pub use node_definition::*;
pub use record_sync::*;
pub use records::*;
pub use ticker::*;
pub use writer::*;
