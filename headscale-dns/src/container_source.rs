//! Defines the interface that [`RecordSync`](crate::RecordSync) requires in order
//! to discover the containers currently running on the node.

use std::collections::HashMap;

/// A snapshot of a running container, reduced to what record rendering needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDescriptor {
    /// Runtime identifier of the container.
    id: String,
    /// Container labels.
    labels: HashMap<String, String>,
}

impl ContainerDescriptor {
    /// Create a descriptor from an identifier and its labels.
    pub fn new<T: ToString>(id: T, labels: HashMap<String, String>) -> Self {
        Self {
            id: id.to_string(),
            labels,
        }
    }

    /// Add a label to the descriptor, replacing any previous value for `key`.
    ///
    /// ```
    /// let container = headscale_dns::ContainerDescriptor::default()
    ///     .with_label("headscale.dns.subdomain", "app");
    /// assert_eq!(container.label("headscale.dns.subdomain"), Some("app"));
    /// ```
    pub fn with_label<K: ToString, V: ToString>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Get the container identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the value of the label `key`, if the container carries it.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Get all the labels of the container.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

/// Interface that provides functionality to
/// acquire the list of running containers on the node.
#[async_trait::async_trait]
pub trait ContainerSource {
    /// Return every container that is currently running.
    /// If nothing is running, an empty Vec is returned.
    async fn running_containers(&self) -> Result<Vec<ContainerDescriptor>, anyhow::Error>;
}
