//! File-backed location store: tracked locations come from the YAML
//! configuration, weather snapshots live as JSON files under the cache
//! directory and are re-attached on every load.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use skysync_core::{load_locations, Location, Weather};
use skysync_engine::{LocationStore, StoreError};

pub struct FileStore {
    locations: Vec<Location>,
    cache_dir: PathBuf,
}

impl FileStore {
    /// Loads the tracked-locations file and prepares the snapshot cache
    /// directory.
    ///
    /// # Errors
    ///
    /// Fails when the locations file is missing/invalid or the cache
    /// directory cannot be created.
    pub fn open(locations_path: &Path, cache_dir: &Path) -> anyhow::Result<Self> {
        let file = load_locations(locations_path)?;
        std::fs::create_dir_all(cache_dir)?;
        Ok(Self {
            locations: file.into_locations(),
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    fn snapshot_path(&self, formatted_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", sanitize_id(formatted_id)))
    }

    async fn attach_weather(&self, mut location: Location) -> Location {
        let path = self.snapshot_path(&location.formatted_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Weather>(&content) {
                Ok(weather) => location.weather = Some(weather),
                Err(err) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %err,
                        "ignoring unreadable cached snapshot"
                    );
                }
            },
            Err(_) => {
                // No cached snapshot yet.
            }
        }
        location
    }
}

#[async_trait]
impl LocationStore for FileStore {
    async fn list_all(&self) -> Result<Vec<Location>, StoreError> {
        let mut out = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            out.push(self.attach_weather(location.clone()).await);
        }
        Ok(out)
    }

    async fn get_by_id(&self, formatted_id: &str) -> Result<Option<Location>, StoreError> {
        match self
            .locations
            .iter()
            .find(|l| l.formatted_id == formatted_id)
        {
            Some(location) => Ok(Some(self.attach_weather(location.clone()).await)),
            None => Ok(None),
        }
    }

    async fn save(&self, location: &Location) -> Result<(), StoreError> {
        let Some(weather) = &location.weather else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(weather)
            .map_err(|e| StoreError::Data(e.to_string()))?;
        let path = self.snapshot_path(&location.formatted_id);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))
    }
}

/// Keeps ids filesystem-safe: anything outside `[A-Za-z0-9_-]` becomes `-`.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
