use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::source::SecondarySources;
use crate::weather::Weather;

/// Stable id for the single location that tracks the device's live position.
pub const CURRENT_POSITION_ID: &str = "current-position";

/// A place the user tracks. Immutable: updates produce a new value copied
/// from the old one (`with_weather`, `with_coordinates`).
///
/// `formatted_id` is unique within a batch; for fixed locations it is derived
/// from coordinates and primary source via [`stable_location_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub formatted_id: String,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// True when coordinates are resolved live from the device rather than
    /// fixed by the user.
    #[serde(default)]
    pub is_current_position: bool,
    /// Primary source id serving this location's forecast.
    pub weather_source: String,
    #[serde(default, skip_serializing_if = "is_default_sources")]
    pub secondary_sources: SecondarySources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
}

fn is_default_sources(s: &SecondarySources) -> bool {
    *s == SecondarySources::default()
}

impl Location {
    /// Copy of this location with `weather` replaced by a new snapshot.
    #[must_use]
    pub fn with_weather(&self, weather: Weather) -> Self {
        Self {
            weather: Some(weather),
            ..self.clone()
        }
    }

    /// Copy of this location with re-resolved coordinates and display name.
    #[must_use]
    pub fn with_coordinates(&self, latitude: f64, longitude: f64, display_name: String) -> Self {
        Self {
            latitude,
            longitude,
            display_name,
            ..self.clone()
        }
    }

    /// Whether this location carries coordinates good enough to fetch with.
    ///
    /// A current-position location that has never been resolved sits at the
    /// (0, 0) placeholder and is not usable; anything with in-range, non-zero
    /// coordinates is.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

/// Derives a stable, collision-resistant id for a fixed location from its
/// coordinates and primary source. Coordinates are rounded to 4 decimal
/// places (~11 m) before hashing so insignificant float noise does not
/// produce a new id.
#[must_use]
pub fn stable_location_id(latitude: f64, longitude: f64, source: &str) -> String {
    let key = format!("{latitude:.4}|{longitude:.4}|{}", source.to_lowercase());
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}
