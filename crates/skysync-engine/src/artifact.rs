//! Error-log artifact: the human-readable text grouping a batch's failed
//! locations by error message.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use skysync_core::Location;

/// Handle to a written error-log artifact. Empty when the write failed or
/// was skipped; consumers treat an empty ref as "no details available".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRef {
    reference: Option<String>,
}

impl ArtifactRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.reference.is_none()
    }
}

/// Sink for the error-log artifact. Must never fail: implementations return
/// [`ArtifactRef::none`] (and log) when the write goes wrong.
pub trait ErrorArtifactWriter: Send + Sync {
    fn write(&self, run_id: Uuid, failures: &[(Location, String)]) -> ArtifactRef;
}

pub struct NoopArtifactWriter;

impl ErrorArtifactWriter for NoopArtifactWriter {
    fn write(&self, _run_id: Uuid, _failures: &[(Location, String)]) -> ArtifactRef {
        ArtifactRef::none()
    }
}

/// Renders the error-log text: one section per distinct error message (in
/// first-seen order), each listing the display names of affected locations.
#[must_use]
pub fn format_error_log(
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    failures: &[(Location, String)],
) -> String {
    let mut sections: Vec<(&str, Vec<&Location>)> = Vec::new();
    for (location, message) in failures {
        match sections.iter_mut().find(|(m, _)| m == message) {
            Some((_, locations)) => locations.push(location),
            None => sections.push((message, vec![location])),
        }
    }

    let mut out = format!(
        "refresh errors for batch {run_id}\ngenerated at {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (message, locations) in sections {
        out.push_str("\n## ");
        out.push_str(message);
        out.push('\n');
        for location in locations {
            out.push_str(&format!(
                "- {} ({})\n",
                location.display_name, location.formatted_id
            ));
        }
    }
    out
}
