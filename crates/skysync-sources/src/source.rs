use async_trait::async_trait;

use skysync_core::{Location, Weather, WeatherFeature};

use crate::error::SourceError;

/// One upstream weather data supplier, identified by a short string id.
///
/// Implementations own their transport, retry, and parsing concerns; the
/// engine only sees a [`Weather`] snapshot or a [`SourceError`]. Timeouts
/// are the implementation's responsibility — the engine imposes none.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Short stable id, e.g. `"openmeteo"`. Locations reference sources by
    /// this id.
    fn id(&self) -> &str;

    /// Human-readable source name for logs and summaries.
    fn name(&self) -> &str;

    /// Fetch a fresh snapshot for `location`, including the requested
    /// secondary `features` where the source supports them.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] variant describing the failure; the engine
    /// classifies it into the user-facing taxonomy.
    async fn fetch(
        &self,
        location: &Location,
        features: &[WeatherFeature],
    ) -> Result<Weather, SourceError>;
}
