//! User-facing refresh error taxonomy.
//!
//! Every failure a location can hit during a refresh batch is normalized to
//! one [`RefreshErrorKind`]. The set is closed: classification (in the
//! engine crate) is total, with `WeatherRequestFailed` as the generic
//! provider-call fallback and `DataRefreshFailed` reserved for unexpected
//! failures in the batch's own bookkeeping.

use serde::{Deserialize, Serialize};

use crate::source::WeatherFeature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshErrorKind {
    NetworkUnavailable,
    ApiUnauthorized,
    ApiLimitReached,
    ServerTimeout,
    ApiKeyMissing,
    InvalidLocation,
    LocationFailed,
    ForegroundLocationPermissionMissing,
    BackgroundLocationPermissionMissing,
    ReverseGeocodingFailed,
    SecondaryWeatherFailed,
    ParsingError,
    SourceNotInstalled,
    WeatherRequestFailed,
    DataRefreshFailed,
}

impl RefreshErrorKind {
    /// Canned short message used when the underlying error carries none.
    #[must_use]
    pub fn short_message(self) -> &'static str {
        match self {
            RefreshErrorKind::NetworkUnavailable => "network is unavailable",
            RefreshErrorKind::ApiUnauthorized => "API access is unauthorized",
            RefreshErrorKind::ApiLimitReached => "API requests limit has been reached",
            RefreshErrorKind::ServerTimeout => "server request timed out",
            RefreshErrorKind::ApiKeyMissing => "a required API key is missing",
            RefreshErrorKind::InvalidLocation => "location is not valid for this source",
            RefreshErrorKind::LocationFailed => "failed to resolve current position",
            RefreshErrorKind::ForegroundLocationPermissionMissing => {
                "location permission is missing"
            }
            RefreshErrorKind::BackgroundLocationPermissionMissing => {
                "background location permission is missing"
            }
            RefreshErrorKind::ReverseGeocodingFailed => "reverse geocoding failed",
            RefreshErrorKind::SecondaryWeatherFailed => {
                "secondary weather data failed to refresh"
            }
            RefreshErrorKind::ParsingError => "weather data could not be parsed",
            RefreshErrorKind::SourceNotInstalled => "weather source is not available",
            RefreshErrorKind::WeatherRequestFailed => "weather request failed",
            RefreshErrorKind::DataRefreshFailed => "data refresh failed",
        }
    }
}

/// A classified refresh failure for one location: the kind, the source and
/// feature it occurred on (when known), and the underlying error's own
/// message when the classifier chose to surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshError {
    pub kind: RefreshErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<WeatherFeature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RefreshError {
    #[must_use]
    pub fn new(kind: RefreshErrorKind) -> Self {
        Self {
            kind,
            source: None,
            feature: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: WeatherFeature) -> Self {
        self.feature = Some(feature);
        self
    }

    /// Attaches the underlying error's own message; empty strings are
    /// discarded so rendering falls back to the canned short message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = (!detail.trim().is_empty()).then_some(detail);
        self
    }

    /// The message to render: the surfaced detail when present, else the
    /// kind's canned short message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .unwrap_or_else(|| self.kind.short_message())
    }
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.source, self.feature) {
            (Some(source), Some(feature)) => {
                write!(f, "{source} ({feature}): {}", self.message())
            }
            (Some(source), None) => write!(f, "{source}: {}", self.message()),
            (None, _) => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for RefreshError {}
