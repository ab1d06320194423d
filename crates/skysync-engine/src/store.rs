//! Collaborator interfaces for persistence and current-position resolution.
//!
//! Implementations live outside the engine; the orchestrator and worker only
//! see these traits.

use async_trait::async_trait;
use thiserror::Error;

use skysync_core::Location;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("location store I/O failure: {0}")]
    Io(String),

    #[error("location store data error: {0}")]
    Data(String),
}

/// Source of truth for tracked locations. Returned locations carry their
/// latest persisted weather snapshot attached.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Every tracked location, in persisted order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    async fn list_all(&self) -> Result<Vec<Location>, StoreError>;

    /// One location by its `formatted_id`, or `None` if it is not tracked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    async fn get_by_id(&self, formatted_id: &str) -> Result<Option<Location>, StoreError>;

    /// Persists `location` (including its replaced weather snapshot). At
    /// most one writer touches a given location within one batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn save(&self, location: &Location) -> Result<(), StoreError>;
}

/// Why resolving a current-position location failed. The classifier maps
/// each variant to its own user-facing error kind.
#[derive(Debug, Clone, Error)]
pub enum LocateError {
    #[error("foreground location permission is missing")]
    ForegroundPermissionMissing,

    #[error("background location permission is missing")]
    BackgroundPermissionMissing,

    #[error("reverse geocoding failed: {0}")]
    ReverseGeocoding(String),

    #[error("failed to resolve current position: {0}")]
    Failed(String),
}

/// Re-resolves the live coordinates (and display name) of a
/// current-position location.
#[async_trait]
pub trait CurrentPositionResolver: Send + Sync {
    /// Returns a copy of `location` with fresh coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError`] when the device position cannot be obtained
    /// or reverse geocoding fails.
    async fn resolve(&self, location: &Location) -> Result<Location, LocateError>;
}
