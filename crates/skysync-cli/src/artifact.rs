use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use skysync_core::Location;
use skysync_engine::{format_error_log, ArtifactRef, ErrorArtifactWriter};

/// Writes the error-log artifact as a text file under the artifact
/// directory. Write failures are logged and reported as an empty ref; this
/// writer never fails the batch.
pub struct FileArtifactWriter {
    dir: PathBuf,
}

impl FileArtifactWriter {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ErrorArtifactWriter for FileArtifactWriter {
    fn write(&self, run_id: Uuid, failures: &[(Location, String)]) -> ArtifactRef {
        let text = format_error_log(run_id, Utc::now(), failures);
        let path = self.dir.join(format!("refresh-errors-{run_id}.txt"));
        let result = std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, text));
        match result {
            Ok(()) => ArtifactRef::new(path.display().to_string()),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to write error-log artifact"
                );
                ArtifactRef::none()
            }
        }
    }
}
