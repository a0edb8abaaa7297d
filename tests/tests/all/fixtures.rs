use headscale_dns::{NodeAddress, NodeDefinition};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

pub const LABEL_KEY: &str = "headscale.dns.subdomain";

/// `node1.ts.net` reachable over IPv4 only.
pub fn ipv4_node() -> NodeDefinition {
    NodeDefinition::from_parts(
        "node1",
        "ts.net",
        NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None),
    )
    .expect("valid node")
}

/// `node1.ts.net` reachable over IPv4 and IPv6.
pub fn dual_stack_node() -> NodeDefinition {
    NodeDefinition::from_parts(
        "node1",
        "ts.net",
        NodeAddress::new(
            Ipv4Addr::new(100, 64, 0, 1),
            Some(Ipv6Addr::new(0xfd7a, 0x115c, 0xa1e0, 0, 0, 0, 0, 1)),
        ),
    )
    .expect("valid node")
}

/// Read the records file back as `(name, type, value)` triples.
pub fn read_records(path: &Path) -> Vec<(String, String, String)> {
    let contents = std::fs::read(path).expect("failed to read records file");
    let records: Vec<serde_json::Value> =
        serde_json::from_slice(&contents).expect("records file is not a JSON array");

    records
        .into_iter()
        .map(|record| {
            let object = record.as_object().expect("record is not an object");
            assert_eq!(object.len(), 3, "unexpected record shape: {:?}", object);
            let field = |key: &str| {
                object[key]
                    .as_str()
                    .unwrap_or_else(|| panic!("'{}' is not a string", key))
                    .to_string()
            };
            (field("name"), field("type"), field("value"))
        })
        .collect()
}

/// Shorthand for building expected triples.
pub fn record(name: &str, record_type: &str, value: &str) -> (String, String, String) {
    (name.to_string(), record_type.to_string(), value.to_string())
}
