//! Implements [`ContainerSource`] for the Docker engine API.

use crate::{ContainerDescriptor, ContainerSource};
use anyhow::Context;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerSummary;
use bollard::Docker;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The state docker reports for containers that are up.
const RUNNING_STATE: &str = "running";

/// The context that stands for "whatever `DOCKER_HOST` or the local socket says".
const DEFAULT_CONTEXT: &str = "default";

/// Seconds before a request to the daemon times out.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Implements [`ContainerSource`] by listing containers through the docker daemon.
pub struct DockerSource {
    docker: Docker,
}

impl DockerSource {
    /// Connect to the docker daemon the way the docker CLI environment says.
    ///
    /// A `DOCKER_CONTEXT` other than `default` is looked up in the docker
    /// config directory (`DOCKER_CONFIG`, or `~/.docker`) and its endpoint is
    /// used, ignoring `DOCKER_HOST`. Otherwise `DOCKER_HOST` is honoured when
    /// set, and the platform socket (`/var/run/docker.sock` or the windows
    /// named pipe) is used when it is not.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let docker_host = non_empty_var("DOCKER_HOST");
        let docker_context = non_empty_var("DOCKER_CONTEXT").filter(|c| c != DEFAULT_CONTEXT);

        let docker = match docker_context {
            Some(docker_context) => {
                if let Some(docker_host) = docker_host {
                    tracing::warn!(%docker_host, %docker_context, "DOCKER_HOST is ignored, DOCKER_CONTEXT is set");
                }

                let config_dir = docker_config_dir()?;
                let host = context_host(&config_dir, &docker_context)?;
                tracing::info!(%docker_context, %host, "using DOCKER_CONTEXT");
                connect_to_host(&host)?
            }
            None => {
                if let Some(docker_host) = docker_host {
                    tracing::info!(%docker_host, "using DOCKER_HOST");
                }
                Docker::connect_with_defaults().context("failed to connect to the docker daemon")?
            }
        };

        Ok(Self { docker })
    }

    /// Wrap an already configured docker client.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

/// `contexts/meta/<digest>/meta.json` in the docker config directory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContextMeta {
    name: String,
    #[serde(default)]
    endpoints: HashMap<String, ContextEndpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContextEndpoint {
    #[serde(default)]
    host: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn docker_config_dir() -> Result<PathBuf, anyhow::Error> {
    if let Some(dir) = non_empty_var("DOCKER_CONFIG") {
        return Ok(PathBuf::from(dir));
    }

    non_empty_var("HOME")
        .map(|home| Path::new(&home).join(".docker"))
        .context("cannot locate the docker config directory: neither DOCKER_CONFIG nor HOME is set")
}

/// Find the docker endpoint of the context called `name`.
fn context_host(config_dir: &Path, name: &str) -> Result<String, anyhow::Error> {
    let meta_dir = config_dir.join("contexts").join("meta");
    let entries = std::fs::read_dir(&meta_dir)
        .with_context(|| format!("docker context {:?} not found in {}", name, meta_dir.display()))?;

    for entry in entries {
        let meta_file = entry?.path().join("meta.json");
        let raw = match std::fs::read(&meta_file) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %meta_file.display(), error = %err, "skipping docker context");
                continue;
            }
        };
        let meta: ContextMeta = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", meta_file.display()))?;

        if meta.name == name {
            return meta
                .endpoints
                .get("docker")
                .and_then(|endpoint| endpoint.host.clone())
                .with_context(|| format!("docker context {:?} has no docker endpoint", name));
        }
    }

    anyhow::bail!("docker context {:?} not found in {}", name, meta_dir.display())
}

fn connect_to_host(host: &str) -> Result<Docker, anyhow::Error> {
    let docker = if host.starts_with("unix://") || host.starts_with("npipe://") {
        Docker::connect_with_local(host, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    } else if host.starts_with("tcp://") || host.starts_with("http://") {
        Docker::connect_with_http(host, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    } else {
        anyhow::bail!("unsupported docker endpoint {:?}", host);
    };

    docker.with_context(|| format!("failed to connect to the docker daemon at {}", host))
}

#[async_trait::async_trait]
impl ContainerSource for DockerSource {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn running_containers(&self) -> Result<Vec<ContainerDescriptor>, anyhow::Error> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .context("failed to list containers")?;

        tracing::debug!("docker returned {} containers", containers.len());

        Ok(containers
            .into_iter()
            .filter(is_running)
            .map(into_descriptor)
            .collect())
    }
}

fn is_running(summary: &ContainerSummary) -> bool {
    summary.state.as_deref() == Some(RUNNING_STATE)
}

fn into_descriptor(summary: ContainerSummary) -> ContainerDescriptor {
    ContainerDescriptor::new(
        summary.id.unwrap_or_default(),
        summary.labels.unwrap_or_default(),
    )
}
