use skysync_core::{Location, RefreshError};

/// Exactly one of these is produced per location per batch.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The fetch succeeded; `after` is `before` with the new snapshot.
    Updated { before: Location, after: Location },
    /// The freshness policy decided no network call was needed.
    Skipped { location: Location, reason: String },
    /// The location's processing failed with a classified error.
    Failed {
        location: Location,
        error: RefreshError,
    },
}

impl RefreshOutcome {
    /// The input location this outcome refers to.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            RefreshOutcome::Updated { before, .. } => before,
            RefreshOutcome::Skipped { location, .. }
            | RefreshOutcome::Failed { location, .. } => location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdatedOutcome {
    pub before: Location,
    pub after: Location,
}

#[derive(Debug, Clone)]
pub struct SkippedOutcome {
    pub location: Location,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct FailedOutcome {
    pub location: Location,
    pub error: RefreshError,
}

/// Final three-bucket result of a batch. Buckets are append-only during the
/// batch; ordering across source groups is not guaranteed.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub updated: Vec<UpdatedOutcome>,
    pub skipped: Vec<SkippedOutcome>,
    pub failed: Vec<FailedOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Updated { before, after } => {
                self.updated.push(UpdatedOutcome { before, after });
            }
            RefreshOutcome::Skipped { location, reason } => {
                self.skipped.push(SkippedOutcome { location, reason });
            }
            RefreshOutcome::Failed { location, error } => {
                self.failed.push(FailedOutcome { location, error });
            }
        }
    }

    /// Locations accounted for so far, across all three buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updated.len() + self.skipped.len() + self.failed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(location, rendered error message)` pairs for the error-log
    /// artifact.
    #[must_use]
    pub fn failures(&self) -> Vec<(Location, String)> {
        self.failed
            .iter()
            .map(|f| (f.location.clone(), f.error.to_string()))
            .collect()
    }
}
