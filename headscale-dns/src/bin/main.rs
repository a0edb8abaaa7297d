//! headscale-dns binary entry point.

use clap::Parser;
use headscale_dns::{telemetry, Config, EnvironmentConfig, RecordSync};
use tracing::{error, info};

/// Publishes hostnames declared by running containers as headscale extra DNS records.
///
/// Configuration is read from `HEADSCALE_DNS_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "headscale-dns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Write the records file once and exit instead of refreshing it periodically.
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging comes first so configuration errors are reported through it.
    let env = EnvironmentConfig::from_env();
    let log_level = env
        .as_ref()
        .map(|env| env.log_level.as_str())
        .unwrap_or(telemetry::DEFAULT_LOG_LEVEL);
    telemetry::init(log_level).map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = match env.and_then(|env| Config::try_from(env)) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return Err(err.into());
        }
    };
    config.log_settings();

    let record_sync = match RecordSync::builder(config.node, config.json_path)
        .label_key(config.label_key)
        .refresh_interval(config.refresh_interval)
        .failure_policy(config.failure_policy)
        .build()
    {
        Ok(record_sync) => record_sync,
        Err(err) => {
            error!(error = ?err, "failed to set up container discovery");
            return Err(err.into());
        }
    };

    if args.once {
        let report = record_sync.sync_once().await.map_err(|err| {
            error!(error = ?err, "sync pass failed");
            err
        })?;
        info!(records = report.records, "records file written, exiting");
        return Ok(());
    }

    tokio::select! {
        result = record_sync.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping");
        }
    }

    Ok(())
}
