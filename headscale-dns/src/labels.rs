//! Turns container labels into the list of requested subdomains.

use crate::ContainerDescriptor;

/// The label consulted when none is configured.
pub const DEFAULT_LABEL_KEY: &str = "headscale.dns.subdomain";

/// Separates several subdomains packed into a single label value.
pub const SUBDOMAIN_SEPARATOR: char = '|';

/// Collect the subdomains requested by `containers` through the label `label_key`.
///
/// Subdomains are returned in label order, then container order.
/// Containers without the label contribute nothing, and the same subdomain
/// requested by two containers is returned twice.
///
/// ```
/// use headscale_dns::{extract_subdomains, ContainerDescriptor};
///
/// let containers = vec![
///     ContainerDescriptor::default().with_label("headscale.dns.subdomain", "app"),
///     ContainerDescriptor::default().with_label("headscale.dns.subdomain", "web | api"),
///     ContainerDescriptor::default().with_label("com.example.other", "ignored"),
/// ];
///
/// let subdomains = extract_subdomains(&containers, "headscale.dns.subdomain");
/// assert_eq!(subdomains, vec!["app", "web", "api"]);
/// ```
pub fn extract_subdomains<'a, I>(containers: I, label_key: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a ContainerDescriptor>,
{
    containers
        .into_iter()
        .filter_map(|container| container.label(label_key))
        .flat_map(split_subdomains)
        .map(str::to_string)
        .collect()
}

/// Split a label value on [`SUBDOMAIN_SEPARATOR`], trimming whitespace and
/// dropping empty pieces.
pub fn split_subdomains(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(SUBDOMAIN_SEPARATOR)
        .map(str::trim)
        .filter(|subdomain| !subdomain.is_empty())
}
