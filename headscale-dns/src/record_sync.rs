//! Provides the builder and implementation of [`RecordSync`], which keeps the
//! records file in line with the running containers.

use crate::{
    render_records, write_records_file, ContainerSource, DockerSource, IntervalTicker,
    NodeDefinition, Ticker, DEFAULT_LABEL_KEY, DEFAULT_REFRESH_INTERVAL,
};
use anyhow::Context as _;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

/// Enumerates what [`RecordSync::run`] does when a sync pass fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the error and try again on the next tick.
    /// The records file keeps its previous content.
    SkipCycle,
    /// Stop the loop and return the error.
    Exit,
}

/// Counters describing one successful sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Running containers found.
    pub containers: usize,
    /// Subdomains requested through labels.
    pub subdomains: usize,
    /// Records written to the file.
    pub records: usize,
}

/// Periodically renders the records of the running containers to a file.
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() -> Result<(), anyhow::Error> {
///     use headscale_dns::{NodeAddress, NodeDefinition, RecordSync};
///     use std::net::Ipv4Addr;
///
///     let node = NodeDefinition::from_parts(
///         "node1",
///         "ts.net",
///         NodeAddress::new(Ipv4Addr::new(100, 64, 0, 1), None),
///     )?;
///
///     let record_sync = RecordSync::builder(node, "/var/lib/headscale/extra-records.json")
///         .refresh_interval(std::time::Duration::from_secs(30))
///         .build()?;
///
///     record_sync.run().await
/// }
/// ```
pub struct RecordSync {
    pass: SyncPass,
    failure_policy: FailurePolicy,
    ticker: Box<dyn Ticker + Send>,
}

/// Everything a single pass needs. Kept apart from the ticker so that a pass
/// only borrows `Sync` state and its future stays `Send`.
struct SyncPass {
    node: NodeDefinition,
    label_key: String,
    output_path: PathBuf,
    container_source: Box<dyn ContainerSource + Send + Sync>,
}

impl RecordSync {
    /// Start configuring a `RecordSync` publishing the subdomains of the
    /// running containers under `node`, into the file at `output_path`.
    pub fn builder<P: Into<PathBuf>>(
        node: NodeDefinition,
        output_path: P,
    ) -> RecordSyncBuilder<DockerSource> {
        RecordSyncBuilder::new(node, output_path)
    }

    /// Get the path of the records file.
    pub fn output_path(&self) -> &Path {
        &self.pass.output_path
    }

    /// Run a single pass: list the running containers, render their records
    /// and replace the records file.
    pub fn sync_once(
        &self,
    ) -> impl Future<Output = Result<SyncReport, anyhow::Error>> + Send + '_ {
        self.pass.sync_once()
    }

    /// Run a pass on every tick until the ticker is exhausted.
    ///
    /// With [`FailurePolicy::Exit`] the first failing pass ends the loop and
    /// its error is returned.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let RecordSync {
            pass,
            failure_policy,
            mut ticker,
        } = self;

        while ticker.tick().await {
            if let Err(err) = pass.sync_once().await {
                match failure_policy {
                    FailurePolicy::Exit => {
                        tracing::error!(error = ?err, "sync pass failed, stopping");
                        return Err(err);
                    }
                    FailurePolicy::SkipCycle => {
                        tracing::error!(error = ?err, "sync pass failed, retrying on next tick");
                    }
                }
            }
        }

        Ok(())
    }
}

impl SyncPass {
    #[tracing::instrument(level = "debug", skip(self), fields(path = %self.output_path.display()))]
    async fn sync_once(&self) -> Result<SyncReport, anyhow::Error> {
        let containers = self
            .container_source
            .running_containers()
            .await
            .context("failed to get running containers")?;
        tracing::info!("found {} running containers", containers.len());

        let rendered = render_records(&containers, &self.label_key, &self.node)
            .context("failed to serialize DNS records")?;
        tracing::info!("discovered {} subdomains", rendered.subdomains.len());

        write_records_file(&self.output_path, &rendered.bytes)
            .await
            .context("failed to write DNS records file")?;
        tracing::info!(
            "successfully wrote {} DNS records to {}",
            rendered.records.len(),
            self.output_path.display()
        );

        Ok(SyncReport {
            containers: containers.len(),
            subdomains: rendered.subdomains.len(),
            records: rendered.records.len(),
        })
    }
}

/// Builder to configure and create a [`RecordSync`].
pub struct RecordSyncBuilder<S> {
    node: NodeDefinition,
    output_path: PathBuf,
    label_key: Option<String>,
    refresh_interval: Option<Duration>,
    failure_policy: FailurePolicy,
    container_source: Option<S>,
    ticker: Option<Box<dyn Ticker + Send>>,
}

impl RecordSyncBuilder<DockerSource> {
    /// Create a builder that lists containers from the local docker daemon,
    /// unless another [`ContainerSource`] is set.
    pub fn new<P: Into<PathBuf>>(node: NodeDefinition, output_path: P) -> Self {
        Self {
            node,
            output_path: output_path.into(),
            label_key: None,
            refresh_interval: None,
            failure_policy: FailurePolicy::SkipCycle,
            container_source: None,
            ticker: None,
        }
    }

    /// Set a custom [`ContainerSource`].
    pub fn container_source<T: ContainerSource + Send + Sync + 'static>(
        self,
        container_source: T,
    ) -> RecordSyncBuilder<T> {
        RecordSyncBuilder {
            container_source: Some(container_source),
            node: self.node,
            output_path: self.output_path,
            label_key: self.label_key,
            refresh_interval: self.refresh_interval,
            failure_policy: self.failure_policy,
            ticker: self.ticker,
        }
    }
}

impl<S: ContainerSource + Send + Sync + 'static> RecordSyncBuilder<S> {
    /// Set the container label holding the subdomains.
    /// Default is `headscale.dns.subdomain`.
    pub fn label_key<K: ToString>(self, label_key: K) -> RecordSyncBuilder<S> {
        Self {
            label_key: Some(label_key.to_string()),
            ..self
        }
    }

    /// Set how often the records file is regenerated.
    /// Default interval in seconds is 60.
    ///
    /// Ignored when a custom [`Ticker`] is set.
    pub fn refresh_interval(self, interval: Duration) -> RecordSyncBuilder<S> {
        Self {
            refresh_interval: Some(interval),
            ..self
        }
    }

    /// Set the [`FailurePolicy`].
    ///
    /// Default set to [`FailurePolicy::SkipCycle`].
    pub fn failure_policy(self, failure_policy: FailurePolicy) -> RecordSyncBuilder<S> {
        Self {
            failure_policy,
            ..self
        }
    }

    /// Set a custom [`Ticker`] deciding when passes run.
    pub fn ticker<T: Ticker + Send + 'static>(self, ticker: T) -> RecordSyncBuilder<S> {
        Self {
            ticker: Some(Box::new(ticker)),
            ..self
        }
    }

    /// Construct a [`RecordSync`] from the [`RecordSyncBuilder`] instance.
    ///
    /// Connects to docker when no [`ContainerSource`] was set.
    pub fn build(mut self) -> Result<RecordSync, anyhow::Error> {
        match self.container_source.take() {
            Some(container_source) => self.build_inner(container_source),
            None => self.build_inner(DockerSource::from_env()?),
        }
    }

    fn build_inner<U>(self, container_source: U) -> Result<RecordSync, anyhow::Error>
    where
        U: ContainerSource + Send + Sync + 'static,
    {
        let refresh_interval = self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        if refresh_interval.is_zero() {
            anyhow::bail!("refresh interval must be greater than zero");
        }

        let ticker: Box<dyn Ticker + Send> = match self.ticker {
            Some(ticker) => ticker,
            None => Box::new(IntervalTicker::new(refresh_interval)),
        };

        Ok(RecordSync {
            pass: SyncPass {
                node: self.node,
                label_key: self
                    .label_key
                    .unwrap_or_else(|| DEFAULT_LABEL_KEY.to_string()),
                output_path: self.output_path,
                container_source: Box::new(container_source),
            },
            failure_policy: self.failure_policy,
            ticker,
        })
    }
}

const _: () = {
    const fn assert_is_send<T: Send>() {}
    assert_is_send::<RecordSyncBuilder<DockerSource>>();
    assert_is_send::<RecordSync>();

    const fn assert_is_sync<T: Sync>() {}
    assert_is_sync::<SyncPass>();
};
