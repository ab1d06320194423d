//! The `refresh` command: gating, wiring, and the user-facing summary.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use skysync_core::AppConfig;
use skysync_engine::{BatchError, BatchOptions, Orchestrator, OrchestratorDeps};
use skysync_sources::{OpenMeteoSource, SourceRegistry};

use crate::artifact::FileArtifactWriter;
use crate::gate::{RefreshGate, RefreshKind};
use crate::notify::{LogNotifier, LogProgressObserver};
use crate::store::FileStore;

/// Builds the source registry for this build. New sources are registered
/// here.
pub fn build_registry(config: &AppConfig) -> anyhow::Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(OpenMeteoSource::new(
        config.source_request_timeout_secs,
        &config.source_user_agent,
        config.source_max_retries,
        config.source_retry_backoff_base_ms,
    )?));
    Ok(registry)
}

/// Runs one refresh batch, honoring the same-kind gating rules: a skipped
/// automatic batch is a quiet no-op, a refused manual batch is an error the
/// operator sees.
///
/// # Errors
///
/// Returns an error when another manual batch is running, the configuration
/// or store cannot be loaded, the target location is unknown, or the batch's
/// own bookkeeping fails.
pub async fn run_refresh(
    config: &AppConfig,
    gate: &RefreshGate,
    kind: RefreshKind,
    target: Option<&str>,
    force: bool,
) -> anyhow::Result<()> {
    let Some(_guard) = gate.try_begin(kind) else {
        match kind {
            RefreshKind::Automatic => {
                tracing::info!("another refresh is running, automatic refresh skipped");
                return Ok(());
            }
            RefreshKind::Manual => {
                anyhow::bail!("another manual refresh is already running");
            }
        }
    };

    tracing::debug!(config = ?config, %kind, "starting {kind} refresh");

    let store = FileStore::open(&config.locations_path, &config.cache_dir)?;
    let registry = build_registry(config)?;

    let orchestrator = Orchestrator::new(
        OrchestratorDeps {
            store: Arc::new(store),
            resolver: Arc::new(FixedPositionResolver),
            registry: Arc::new(registry),
            notifier: Arc::new(LogNotifier),
            observer: Arc::new(LogProgressObserver),
            artifacts: Arc::new(FileArtifactWriter::new(config.artifact_dir.clone())),
        },
        BatchOptions {
            validity_hours: config.refresh_validity_hours,
            max_concurrent_sources: config.refresh_max_concurrent_sources,
            ignore_freshness: force || config.refresh_ignore_freshness,
        },
    );

    // Ctrl-C cancels the batch cooperatively; already-completed locations
    // keep their outcome.
    let cancel = CancellationToken::new();
    let signal_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("cancellation requested, stopping after in-flight locations");
                cancel.cancel();
            }
        })
    };

    let result = orchestrator.run_batch(target, &cancel).await;
    signal_task.abort();

    let report = match result {
        Ok(report) => report,
        Err(err @ BatchError::UnknownLocation(_)) => return Err(err.into()),
        // Anything else is reported as a single whole-batch error.
        Err(err) => anyhow::bail!("{}", err.to_refresh_error()),
    };

    if config.notify_skipped && !report.skipped.is_empty() {
        let skipped: Vec<&str> = report
            .skipped
            .iter()
            .map(|s| s.location.display_name.as_str())
            .collect();
        tracing::info!(skipped = ?skipped, "locations skipped as already fresh");
    }

    println!(
        "updated {} location(s), skipped {}, failed {}{}",
        report.updated.len(),
        report.skipped.len(),
        report.failed.len(),
        if cancel.is_cancelled() {
            " (cancelled)"
        } else {
            ""
        }
    );
    Ok(())
}

/// Resolver for builds without device positioning: current-position
/// locations keep their last known coordinates when usable.
struct FixedPositionResolver;

#[async_trait::async_trait]
impl skysync_engine::CurrentPositionResolver for FixedPositionResolver {
    async fn resolve(
        &self,
        location: &skysync_core::Location,
    ) -> Result<skysync_core::Location, skysync_engine::LocateError> {
        if location.is_usable() {
            Ok(location.clone())
        } else {
            Err(skysync_engine::LocateError::Failed(
                "no positioning backend available".to_string(),
            ))
        }
    }
}
