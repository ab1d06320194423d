use serde::{Deserialize, Serialize};

/// A weather data feature a location may fetch from a source other than its
/// primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherFeature {
    Current,
    AirQuality,
    Pollen,
    Minutely,
    Alerts,
    Normals,
}

impl std::fmt::Display for WeatherFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherFeature::Current => write!(f, "current"),
            WeatherFeature::AirQuality => write!(f, "air quality"),
            WeatherFeature::Pollen => write!(f, "pollen"),
            WeatherFeature::Minutely => write!(f, "minutely"),
            WeatherFeature::Alerts => write!(f, "alerts"),
            WeatherFeature::Normals => write!(f, "normals"),
        }
    }
}

/// Per-feature source overrides for a location. `None` means the feature is
/// served by the location's primary source (or not fetched at all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutely: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<String>,
}

impl SecondarySources {
    /// Returns the override source id for `feature`, if one is configured.
    #[must_use]
    pub fn for_feature(&self, feature: WeatherFeature) -> Option<&str> {
        match feature {
            WeatherFeature::Current => self.current.as_deref(),
            WeatherFeature::AirQuality => self.air_quality.as_deref(),
            WeatherFeature::Pollen => self.pollen.as_deref(),
            WeatherFeature::Minutely => self.minutely.as_deref(),
            WeatherFeature::Alerts => self.alerts.as_deref(),
            WeatherFeature::Normals => self.normals.as_deref(),
        }
    }

    /// Returns `(feature, source_id)` pairs for every configured override.
    #[must_use]
    pub fn configured(&self) -> Vec<(WeatherFeature, &str)> {
        [
            WeatherFeature::Current,
            WeatherFeature::AirQuality,
            WeatherFeature::Pollen,
            WeatherFeature::Minutely,
            WeatherFeature::Alerts,
            WeatherFeature::Normals,
        ]
        .into_iter()
        .filter_map(|f| self.for_feature(f).map(|s| (f, s)))
        .collect()
    }
}
