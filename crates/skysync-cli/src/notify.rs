//! Log-backed notifier and progress observer for the CLI. A desktop or
//! mobile shell would replace these with real notifications and widgets.

use async_trait::async_trait;

use skysync_core::{Location, Weather};
use skysync_engine::{ArtifactRef, PostUpdateNotifier, ProgressObserver, ProgressSnapshot};

pub struct LogNotifier;

#[async_trait]
impl PostUpdateNotifier for LogNotifier {
    async fn on_batch_updated(&self, all_locations: &[Location]) {
        tracing::info!(locations = all_locations.len(), "widgets and shortcuts refreshed");
    }

    async fn on_first_location_alert(&self, location: &Location, previous: Option<&Weather>) {
        let current_alerts = location
            .weather
            .as_ref()
            .map_or(0, |w| w.alerts.len());
        let previous_alerts = previous.map_or(0, |w| w.alerts.len());
        tracing::info!(
            location = %location.display_name,
            current_alerts,
            previous_alerts,
            "alert notification for first location"
        );
    }

    async fn on_first_location_precipitation(&self, location: &Location) {
        tracing::info!(
            location = %location.display_name,
            "precipitation notification for first location"
        );
    }

    async fn on_batch_failed(&self, failed_count: usize, artifact: &ArtifactRef) {
        match artifact.reference() {
            Some(path) => tracing::warn!(
                failed_count,
                details = %path,
                "some locations failed to update"
            ),
            None => tracing::warn!(failed_count, "some locations failed to update"),
        }
    }
}

pub struct LogProgressObserver;

impl ProgressObserver for LogProgressObserver {
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        let processing: Vec<&str> = snapshot
            .processing
            .iter()
            .map(|l| l.display_name.as_str())
            .collect();
        tracing::debug!(
            completed = snapshot.completed,
            total = snapshot.total,
            processing = ?processing,
            "refresh progress"
        );
    }

    fn on_batch_finished(&self) {
        tracing::debug!("refresh progress indicator dismissed");
    }
}
