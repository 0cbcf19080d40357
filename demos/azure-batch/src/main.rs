use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use flotilla_azure::{AciClient, AzureConfig};
use flotilla_core::{
    BatchConfig, BatchContext, ComputeParams, FailurePolicy, Pacing, run_batch,
};
use flotilla_model::BatchRun;
use flotilla_observe::logger_init_from_env;
use flotilla_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

const LOG: &str = "flotilla.demo";

fn var(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} is not set"))
}

fn var_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn batch_config() -> anyhow::Result<BatchConfig> {
    let batch_id = env::var("FLOTILLA_BATCH_ID")
        .unwrap_or_else(|_| uuid::Uuid::new_v4().simple().to_string()[..8].to_string());
    let batch = BatchRun::new(
        var("FLOTILLA_EXPERIMENT_ID")?,
        batch_id,
        var_or("FLOTILLA_RUNNERS", 1u32)?,
    );

    let mut compute = ComputeParams::new(var("FLOTILLA_IMAGE")?, var("FLOTILLA_DB_URI")?);
    compute.timeout = var_or("FLOTILLA_TIMEOUT", 0)?;
    compute.raise_exception = var_or("FLOTILLA_RAISE_EXCEPTION", false)?;
    compute.limits.cpu = var_or("FLOTILLA_CPU", compute.limits.cpu)?;
    compute.limits.memory_in_gb = var_or("FLOTILLA_MEMORY_GB", compute.limits.memory_in_gb)?;
    if let Ok(prefix) = env::var("FLOTILLA_PREFIX") {
        compute.name_prefix = prefix;
    }

    let mut config = BatchConfig::new(batch, compute);
    config.cleanup_on_complete = var_or("FLOTILLA_CLEANUP", true)?;
    if var_or("FLOTILLA_ROLLBACK", false)? {
        config.failure_policy = FailurePolicy::Rollback;
    }
    config.pacing = Pacing::uniform(Duration::from_secs(var_or("FLOTILLA_POLL_SECS", 1)?));
    config.pacing.tolerated_query_errors = var_or("FLOTILLA_TOLERATED_QUERY_ERRORS", 0)?;
    let deadline: u64 = var_or("FLOTILLA_DEADLINE_SECS", 0)?;
    if deadline > 0 {
        config.pacing.deadline = Some(Duration::from_secs(deadline));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    logger_init_from_env()?;

    // 2) Provider
    let azure = AzureConfig::from_file(var("FLOTILLA_AZURE_CONFIG")?)?;
    let client = AciClient::new(azure);
    let group = client.resource_group().await?;
    info!(target: LOG, group = %group.name, location = %group.location, "resource group resolved");

    // 3) Batch
    let config = batch_config()?;
    let metrics = PrometheusMetrics::new()?;
    let cancel = CancellationToken::new();
    let ctx = BatchContext::new()
        .with_metrics(Arc::new(metrics.clone()))
        .with_cancel(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: LOG, "interrupt received, cancelling batch");
            cancel.cancel();
        }
    });

    // 4) Run
    let outcome = run_batch(&client, &group, &config, &ctx).await;

    let mut buf = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buf)?;
    print!("{}", String::from_utf8_lossy(&buf));

    match outcome {
        Ok(report) => {
            info!(
                target: LOG,
                targeted = report.targeted.len(),
                deleted = report.deleted.len(),
                "batch {} finished",
                config.batch.batch_id
            );
            Ok(())
        }
        Err(e) => {
            for name in ctx.ledger.possibly_live() {
                error!(target: LOG, runner = %name, "may still exist; delete it manually");
            }
            Err(e.into())
        }
    }
}
