//! Batch refresh coordination: grouping, bounded fan-out, fan-in, outcome
//! buckets, and post-batch side effects.
//!
//! One task is spawned per source group; locations within a group are
//! processed serially so a single upstream is never hit with parallel
//! requests, while at most `max_concurrent_sources` groups fetch at once.
//! A failure inside one location never cancels sibling locations or
//! sibling groups.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use skysync_core::{RefreshError, RefreshErrorKind, DEFAULT_VALIDITY_HOURS};
use skysync_sources::{SourceRegistry, WeatherSource};

use crate::artifact::ErrorArtifactWriter;
use crate::grouping::{group_by_source, SourceGroup};
use crate::notify::PostUpdateNotifier;
use crate::outcome::{BatchReport, RefreshOutcome};
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::store::{CurrentPositionResolver, LocationStore, StoreError};
use crate::worker::{refresh_location, WorkerContext};

/// Cap on source groups fetching concurrently within one batch.
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 5;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub validity_hours: f32,
    pub max_concurrent_sources: usize,
    /// Development override: refresh every location regardless of freshness.
    pub ignore_freshness: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            validity_hours: DEFAULT_VALIDITY_HOURS,
            max_concurrent_sources: DEFAULT_MAX_CONCURRENT_SOURCES,
            ignore_freshness: false,
        }
    }
}

/// Collaborators the orchestrator drives. All are shared handles so group
/// tasks can hold them across await points.
pub struct OrchestratorDeps {
    pub store: Arc<dyn LocationStore>,
    pub resolver: Arc<dyn CurrentPositionResolver>,
    pub registry: Arc<SourceRegistry>,
    pub notifier: Arc<dyn PostUpdateNotifier>,
    pub observer: Arc<dyn ProgressObserver>,
    pub artifacts: Arc<dyn ErrorArtifactWriter>,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("location '{0}' is not tracked")]
    UnknownLocation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected failure in the batch's own bookkeeping, outside any
    /// location's processing.
    #[error("refresh batch bookkeeping failed: {0}")]
    Internal(String),
}

impl BatchError {
    /// The single classified error reported for the whole batch when the
    /// orchestrator itself fails.
    #[must_use]
    pub fn to_refresh_error(&self) -> RefreshError {
        RefreshError::new(RefreshErrorKind::DataRefreshFailed).with_detail(self.to_string())
    }
}

pub struct Orchestrator {
    deps: OrchestratorDeps,
    options: BatchOptions,
}

impl Orchestrator {
    #[must_use]
    pub fn new(deps: OrchestratorDeps, options: BatchOptions) -> Self {
        Self { deps, options }
    }

    /// Runs one refresh batch over every tracked location, or over the
    /// single location named by `target`.
    ///
    /// Cancelling `cancel` stops the batch cooperatively: in-flight
    /// locations are abandoned, already-completed outcomes are kept, and
    /// the call still returns `Ok` with the partial report — cancellation
    /// is not a failure at the job boundary.
    ///
    /// # Errors
    ///
    /// - [`BatchError::UnknownLocation`] — `target` names an untracked
    ///   location.
    /// - [`BatchError::Store`] — the location store could not be read.
    /// - [`BatchError::Internal`] — unexpected bookkeeping failure; the
    ///   caller reports it as a single whole-batch error via
    ///   [`BatchError::to_refresh_error`].
    pub async fn run_batch(
        &self,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(
            %run_id,
            target = target.unwrap_or("all"),
            "refresh batch starting"
        );

        let result = self.run_batch_inner(run_id, target, cancel).await;

        // Progress-indicator cleanup happens however the batch ended.
        self.deps.observer.on_batch_finished();

        match &result {
            Ok(report) => {
                tracing::info!(
                    %run_id,
                    updated = report.updated.len(),
                    skipped = report.skipped.len(),
                    failed = report.failed.len(),
                    cancelled = cancel.is_cancelled(),
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "refresh batch finished"
                );
            }
            Err(err) => {
                tracing::error!(%run_id, error = %err, "refresh batch failed");
            }
        }
        result
    }

    async fn run_batch_inner(
        &self,
        run_id: Uuid,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let working_set = match target {
            Some(id) => {
                let location = self
                    .deps
                    .store
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| BatchError::UnknownLocation(id.to_string()))?;
                vec![location]
            }
            None => self.deps.store.list_all().await?,
        };

        if working_set.is_empty() {
            tracing::debug!(%run_id, "no tracked locations, nothing to refresh");
            return Ok(BatchReport::default());
        }

        let total = working_set.len();
        let groups = group_by_source(working_set);
        tracing::debug!(%run_id, locations = total, groups = groups.len(), "working set grouped");

        let tracker = Arc::new(ProgressTracker::new(total, Arc::clone(&self.deps.observer)));
        let report = Arc::new(Mutex::new(BatchReport::default()));
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_sources.max(1)));

        let mut tasks = JoinSet::new();
        for group in groups {
            let primary = self.deps.registry.get(&group.source_id);
            tasks.spawn(run_group(GroupTask {
                group,
                primary,
                store: Arc::clone(&self.deps.store),
                resolver: Arc::clone(&self.deps.resolver),
                registry: Arc::clone(&self.deps.registry),
                semaphore: Arc::clone(&semaphore),
                tracker: Arc::clone(&tracker),
                report: Arc::clone(&report),
                cancel: cancel.clone(),
                validity_hours: self.options.validity_hours,
                ignore_freshness: self.options.ignore_freshness,
            }));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                return Err(BatchError::Internal(format!("group task died: {err}")));
            }
        }

        let report = Arc::try_unwrap(report)
            .map_err(|_| BatchError::Internal("outcome buckets still shared".to_string()))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        if !cancel.is_cancelled() {
            self.post_actions(run_id, &report).await?;
        }

        Ok(report)
    }

    /// Batch-level side effects, executed once after fan-in.
    async fn post_actions(&self, run_id: Uuid, report: &BatchReport) -> Result<(), BatchError> {
        if !report.updated.is_empty() {
            // Reload so side effects of other writers are reflected in what
            // the notifier sees.
            let all = self.deps.store.list_all().await?;
            self.deps.notifier.on_batch_updated(&all).await;
            self.notify_first_location(&all, report).await;
        }

        if !report.failed.is_empty() {
            let failures = report.failures();
            let artifact = self.deps.artifacts.write(run_id, &failures);
            self.deps
                .notifier
                .on_batch_failed(failures.len(), &artifact)
                .await;
        }

        Ok(())
    }

    /// Only the first location in persisted order receives alert and
    /// precipitation pushes, and only when this batch updated it. Kept for
    /// compatibility with the historical behavior; isolated here so it can
    /// be revisited on its own.
    async fn notify_first_location(
        &self,
        all_locations: &[skysync_core::Location],
        report: &BatchReport,
    ) {
        let Some(first) = all_locations.first() else {
            return;
        };
        let Some(updated) = report
            .updated
            .iter()
            .find(|u| u.after.formatted_id == first.formatted_id)
        else {
            return;
        };
        self.deps
            .notifier
            .on_first_location_alert(&updated.after, updated.before.weather.as_ref())
            .await;
        self.deps
            .notifier
            .on_first_location_precipitation(&updated.after)
            .await;
    }
}

struct GroupTask {
    group: SourceGroup,
    primary: Option<Arc<dyn WeatherSource>>,
    store: Arc<dyn LocationStore>,
    resolver: Arc<dyn CurrentPositionResolver>,
    registry: Arc<SourceRegistry>,
    semaphore: Arc<Semaphore>,
    tracker: Arc<ProgressTracker>,
    report: Arc<Mutex<BatchReport>>,
    cancel: CancellationToken,
    validity_hours: f32,
    ignore_freshness: bool,
}

/// Processes one source group: waits for a concurrency permit, then walks
/// the group's locations serially. The permit is held for the whole fetch
/// phase and released on every exit path by drop.
async fn run_group(task: GroupTask) {
    let _permit = tokio::select! {
        () = task.cancel.cancelled() => return,
        permit = Arc::clone(&task.semaphore).acquire_owned() => {
            match permit {
                Ok(permit) => permit,
                // The semaphore is never closed while tasks run.
                Err(_) => return,
            }
        }
    };

    tracing::debug!(
        source = %task.group.source_id,
        locations = task.group.locations.len(),
        "source group fetch started"
    );
    if task.primary.is_none() {
        tracing::warn!(
            source = %task.group.source_id,
            "no client registered for source, its locations will fail"
        );
    }

    for location in &task.group.locations {
        if task.cancel.is_cancelled() {
            break;
        }
        task.tracker.started(location);

        let ctx = WorkerContext {
            resolver: &*task.resolver,
            registry: &task.registry,
            primary: task.primary.as_ref(),
            validity_hours: task.validity_hours,
            ignore_freshness: task.ignore_freshness,
            cancel: &task.cancel,
        };

        match refresh_location(&ctx, location.clone()).await {
            Some(outcome) => {
                if let RefreshOutcome::Updated { after, .. } = &outcome {
                    if let Err(err) = task.store.save(after).await {
                        tracing::warn!(
                            location = %after.formatted_id,
                            error = %err,
                            "failed to persist refreshed snapshot"
                        );
                    }
                }
                if let RefreshOutcome::Failed { location, error } = &outcome {
                    tracing::warn!(
                        location = %location.formatted_id,
                        error = %error,
                        "location refresh failed"
                    );
                }
                task.tracker.finished(location);
                task.report
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(outcome);
            }
            None => {
                task.tracker.abandoned(location);
                break;
            }
        }
    }
}
