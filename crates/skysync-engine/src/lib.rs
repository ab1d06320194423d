pub mod artifact;
pub mod classify;
pub mod grouping;
pub mod notify;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod store;
mod worker;

pub use artifact::{format_error_log, ArtifactRef, ErrorArtifactWriter, NoopArtifactWriter};
pub use classify::{classify, RefreshFailure};
pub use grouping::{group_by_source, SourceGroup};
pub use notify::{NoopNotifier, PostUpdateNotifier};
pub use orchestrator::{
    BatchError, BatchOptions, Orchestrator, OrchestratorDeps, DEFAULT_MAX_CONCURRENT_SOURCES,
};
pub use outcome::{BatchReport, FailedOutcome, RefreshOutcome, SkippedOutcome, UpdatedOutcome};
pub use progress::{NoopObserver, ProgressObserver, ProgressSnapshot, ProgressTracker};
pub use store::{CurrentPositionResolver, LocateError, LocationStore, StoreError};
