//! Tracked-locations configuration file.
//!
//! The YAML file lists every location the user tracks, its primary source,
//! and optional per-feature source overrides. Entries without an explicit id
//! get a stable one derived from coordinates and source.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::location::{stable_location_id, Location, CURRENT_POSITION_ID};
use crate::source::SecondarySources;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    #[serde(default)]
    pub current_position: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<SecondarySources>,
}

impl LocationConfig {
    /// The location's stable id: the explicit one when set, the fixed
    /// current-position id for live locations, else derived from
    /// coordinates + source.
    #[must_use]
    pub fn formatted_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        if self.current_position {
            return CURRENT_POSITION_ID.to_string();
        }
        stable_location_id(
            self.latitude.unwrap_or_default(),
            self.longitude.unwrap_or_default(),
            &self.source,
        )
    }

    /// Builds the domain [`Location`] (no weather attached yet).
    #[must_use]
    pub fn to_location(&self) -> Location {
        Location {
            formatted_id: self.formatted_id(),
            display_name: self.name.clone(),
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            is_current_position: self.current_position,
            weather_source: self.source.clone(),
            secondary_sources: self.sources.clone().unwrap_or_default(),
            weather: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationsFile {
    pub locations: Vec<LocationConfig>,
}

impl LocationsFile {
    /// Converts every entry into a domain [`Location`], preserving file order.
    #[must_use]
    pub fn into_locations(self) -> Vec<Location> {
        self.locations.iter().map(LocationConfig::to_location).collect()
    }
}

/// Load and validate the tracked-locations configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (duplicate ids, out-of-range coordinates, missing coordinates
/// on a fixed location, empty source id).
pub fn load_locations(path: &Path) -> Result<LocationsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: LocationsFile = serde_yaml::from_str(&content)?;
    validate_locations(&file)?;
    Ok(file)
}

fn validate_locations(file: &LocationsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for entry in &file.locations {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location name must be non-empty".to_string(),
            ));
        }
        if entry.source.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has an empty source id",
                entry.name
            )));
        }
        if !entry.current_position {
            let (Some(lat), Some(lon)) = (entry.latitude, entry.longitude) else {
                return Err(ConfigError::Validation(format!(
                    "location '{}' is fixed but has no coordinates",
                    entry.name
                )));
            };
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has latitude {lat} outside [-90, 90]",
                    entry.name
                )));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has longitude {lon} outside [-180, 180]",
                    entry.name
                )));
            }
        }

        let id = entry.formatted_id();
        if !seen_ids.insert(id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location id: '{id}' (from location '{}')",
                entry.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<LocationsFile, ConfigError> {
        let file: LocationsFile = serde_yaml::from_str(yaml)?;
        validate_locations(&file)?;
        Ok(file)
    }

    const VALID: &str = r"
locations:
  - name: Berlin
    latitude: 52.52
    longitude: 13.405
    source: openmeteo
    sources:
      alerts: dwd
  - name: Current position
    current_position: true
    source: openmeteo
";

    #[test]
    fn parses_valid_file_and_derives_ids() {
        let file = parse(VALID).unwrap();
        let locations = file.into_locations();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].formatted_id.len(), 16);
        assert_eq!(locations[0].secondary_sources.alerts.as_deref(), Some("dwd"));
        assert_eq!(locations[1].formatted_id, CURRENT_POSITION_ID);
        assert!(locations[1].is_current_position);
    }

    #[test]
    fn explicit_id_wins_over_derived() {
        let yaml = r"
locations:
  - name: Berlin
    id: home
    latitude: 52.52
    longitude: 13.405
    source: openmeteo
";
        let file = parse(yaml).unwrap();
        assert_eq!(file.locations[0].formatted_id(), "home");
    }

    #[test]
    fn rejects_fixed_location_without_coordinates() {
        let yaml = r"
locations:
  - name: Nowhere
    source: openmeteo
";
        let result = parse(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("Nowhere")));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let yaml = r"
locations:
  - name: OffTheMap
    latitude: 95.0
    longitude: 13.4
    source: openmeteo
";
        let result = parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("latitude")),
            "expected latitude validation error, got {result:?}"
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r"
locations:
  - name: Berlin
    latitude: 52.52
    longitude: 13.405
    source: openmeteo
  - name: Berlin again
    latitude: 52.52
    longitude: 13.405
    source: openmeteo
";
        let result = parse(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_empty_source() {
        let yaml = r#"
locations:
  - name: Berlin
    latitude: 52.52
    longitude: 13.405
    source: ""
"#;
        let result = parse(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("source")));
    }
}
