use async_trait::async_trait;

use skysync_core::{Location, Weather};

use crate::artifact::ArtifactRef;

/// Post-batch side effects: notifications, widgets, shortcuts. Implemented
/// outside the engine; every method is best-effort and infallible from the
/// orchestrator's point of view.
#[async_trait]
pub trait PostUpdateNotifier: Send + Sync {
    /// Invoked once after a batch with at least one update, with the full
    /// reloaded location list.
    async fn on_batch_updated(&self, all_locations: &[Location]);

    /// Alert push for the first tracked location. `previous` is the weather
    /// the location carried before this batch, for new-alert diffing.
    async fn on_first_location_alert(&self, location: &Location, previous: Option<&Weather>);

    /// Precipitation push for the first tracked location.
    async fn on_first_location_precipitation(&self, location: &Location);

    /// Invoked once when a batch ends with failures, with a reference to
    /// the error-log artifact.
    async fn on_batch_failed(&self, failed_count: usize, artifact: &ArtifactRef);
}

pub struct NoopNotifier;

#[async_trait]
impl PostUpdateNotifier for NoopNotifier {
    async fn on_batch_updated(&self, _all_locations: &[Location]) {}

    async fn on_first_location_alert(&self, _location: &Location, _previous: Option<&Weather>) {}

    async fn on_first_location_precipitation(&self, _location: &Location) {}

    async fn on_batch_failed(&self, _failed_count: usize, _artifact: &ArtifactRef) {}
}
