//! Normalizes the long tail of refresh failures into the closed
//! [`RefreshErrorKind`] taxonomy.
//!
//! Classification is a pure, total function over the [`RefreshFailure`]
//! tagged union: every input maps to exactly one kind, with
//! `WeatherRequestFailed` as the provider-call catch-all and
//! `DataRefreshFailed` reserved for failures in the batch's own bookkeeping.

use skysync_core::{RefreshError, RefreshErrorKind, WeatherFeature};
use skysync_sources::SourceError;

use crate::store::LocateError;

/// Everything that can go wrong while refreshing one location.
#[derive(Debug)]
pub enum RefreshFailure {
    /// The primary weather fetch failed.
    Source(SourceError),
    /// A secondary feature, fetched from a different source than the
    /// primary one, failed.
    Secondary {
        feature: WeatherFeature,
        source: String,
        error: SourceError,
    },
    /// Current-position resolution failed (and no usable fallback existed).
    Locate(LocateError),
    /// The orchestrator's own bookkeeping failed outside any source call.
    Internal(String),
}

/// Maps `failure` to a classified [`RefreshError`]. First match wins;
/// transport-level kinds outrank the secondary-feature grouping, which in
/// turn outranks parse and availability problems.
#[must_use]
pub fn classify(failure: &RefreshFailure) -> RefreshError {
    match failure {
        RefreshFailure::Source(error) => classify_source(error),
        RefreshFailure::Secondary {
            feature,
            source,
            error,
        } => {
            let base = classify_source(error);
            let classified = if outranks_secondary(base.kind) {
                base
            } else {
                RefreshError::new(RefreshErrorKind::SecondaryWeatherFailed)
            };
            classified.with_source(source.clone()).with_feature(*feature)
        }
        RefreshFailure::Locate(error) => classify_locate(error),
        RefreshFailure::Internal(message) => {
            RefreshError::new(RefreshErrorKind::DataRefreshFailed).with_detail(message.clone())
        }
    }
}

fn classify_source(error: &SourceError) -> RefreshError {
    match error {
        SourceError::NetworkUnavailable(_) => {
            RefreshError::new(RefreshErrorKind::NetworkUnavailable)
        }
        SourceError::Status { status, .. } if matches!(*status, 401 | 403) => {
            RefreshError::new(RefreshErrorKind::ApiUnauthorized)
        }
        SourceError::Status { status, .. } if matches!(*status, 409 | 429) => {
            RefreshError::new(RefreshErrorKind::ApiLimitReached)
        }
        SourceError::RateLimited { .. } => RefreshError::new(RefreshErrorKind::ApiLimitReached),
        SourceError::Timeout => RefreshError::new(RefreshErrorKind::ServerTimeout),
        SourceError::ApiKeyMissing { .. } => RefreshError::new(RefreshErrorKind::ApiKeyMissing),
        SourceError::InvalidLocation { .. } => {
            RefreshError::new(RefreshErrorKind::InvalidLocation)
        }
        SourceError::Deserialize { .. } => RefreshError::new(RefreshErrorKind::ParsingError),
        SourceError::NotInstalled { .. } => {
            RefreshError::new(RefreshErrorKind::SourceNotInstalled)
        }
        // Remaining HTTP statuses and the catch-all surface the error's own
        // message text when it has one.
        SourceError::Status { message, .. } => {
            RefreshError::new(RefreshErrorKind::WeatherRequestFailed).with_detail(message.clone())
        }
        SourceError::Unexpected(message) => {
            RefreshError::new(RefreshErrorKind::WeatherRequestFailed).with_detail(message.clone())
        }
    }
}

fn classify_locate(error: &LocateError) -> RefreshError {
    let kind = match error {
        LocateError::ForegroundPermissionMissing => {
            RefreshErrorKind::ForegroundLocationPermissionMissing
        }
        LocateError::BackgroundPermissionMissing => {
            RefreshErrorKind::BackgroundLocationPermissionMissing
        }
        LocateError::ReverseGeocoding(_) => RefreshErrorKind::ReverseGeocodingFailed,
        LocateError::Failed(_) => RefreshErrorKind::LocationFailed,
    };
    RefreshError::new(kind)
}

/// Kinds that sit above `SecondaryWeatherFailed` in the priority order and
/// therefore keep their identity even when the failing call was for a
/// secondary feature.
fn outranks_secondary(kind: RefreshErrorKind) -> bool {
    matches!(
        kind,
        RefreshErrorKind::NetworkUnavailable
            | RefreshErrorKind::ApiUnauthorized
            | RefreshErrorKind::ApiLimitReached
            | RefreshErrorKind::ServerTimeout
            | RefreshErrorKind::ApiKeyMissing
            | RefreshErrorKind::InvalidLocation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: &str) -> SourceError {
        SourceError::Status {
            status: code,
            message: message.to_string(),
        }
    }

    #[test]
    fn http_401_and_403_are_unauthorized() {
        for code in [401, 403] {
            let err = classify(&RefreshFailure::Source(status(code, "denied")));
            assert_eq!(err.kind, RefreshErrorKind::ApiUnauthorized, "code {code}");
        }
    }

    #[test]
    fn http_409_and_429_and_rate_limit_signal_are_limit_reached() {
        for code in [409, 429] {
            let err = classify(&RefreshFailure::Source(status(code, "slow down")));
            assert_eq!(err.kind, RefreshErrorKind::ApiLimitReached, "code {code}");
        }
        let err = classify(&RefreshFailure::Source(SourceError::RateLimited {
            retry_after_secs: Some(60),
        }));
        assert_eq!(err.kind, RefreshErrorKind::ApiLimitReached);
    }

    #[test]
    fn network_and_timeout_map_to_their_kinds() {
        let err = classify(&RefreshFailure::Source(SourceError::NetworkUnavailable(
            "dns".to_string(),
        )));
        assert_eq!(err.kind, RefreshErrorKind::NetworkUnavailable);

        let err = classify(&RefreshFailure::Source(SourceError::Timeout));
        assert_eq!(err.kind, RefreshErrorKind::ServerTimeout);
    }

    #[test]
    fn unmatched_http_status_surfaces_its_own_message() {
        let err = classify(&RefreshFailure::Source(status(502, "bad gateway")));
        assert_eq!(err.kind, RefreshErrorKind::WeatherRequestFailed);
        assert_eq!(err.message(), "bad gateway");
    }

    #[test]
    fn unmatched_http_status_with_empty_message_uses_canned_text() {
        let err = classify(&RefreshFailure::Source(status(500, "")));
        assert_eq!(err.kind, RefreshErrorKind::WeatherRequestFailed);
        assert_eq!(err.message(), "weather request failed");
    }

    #[test]
    fn unrecognized_error_is_generic_never_empty() {
        let err = classify(&RefreshFailure::Source(SourceError::Unexpected(
            "something odd".to_string(),
        )));
        assert_eq!(err.kind, RefreshErrorKind::WeatherRequestFailed);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn parse_and_not_installed_map_to_their_kinds() {
        let parse = serde_json::from_str::<()>("x").unwrap_err();
        let err = classify(&RefreshFailure::Source(SourceError::Deserialize {
            context: "body".to_string(),
            source: parse,
        }));
        assert_eq!(err.kind, RefreshErrorKind::ParsingError);

        let err = classify(&RefreshFailure::Source(SourceError::NotInstalled {
            source_id: "china".to_string(),
        }));
        assert_eq!(err.kind, RefreshErrorKind::SourceNotInstalled);
    }

    #[test]
    fn locate_failures_map_to_location_kinds() {
        let cases = [
            (
                LocateError::ForegroundPermissionMissing,
                RefreshErrorKind::ForegroundLocationPermissionMissing,
            ),
            (
                LocateError::BackgroundPermissionMissing,
                RefreshErrorKind::BackgroundLocationPermissionMissing,
            ),
            (
                LocateError::ReverseGeocoding("no address".to_string()),
                RefreshErrorKind::ReverseGeocodingFailed,
            ),
            (
                LocateError::Failed("gps off".to_string()),
                RefreshErrorKind::LocationFailed,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(classify(&RefreshFailure::Locate(input)).kind, expected);
        }
    }

    #[test]
    fn secondary_parse_failure_becomes_secondary_weather_failed() {
        let parse = serde_json::from_str::<()>("x").unwrap_err();
        let err = classify(&RefreshFailure::Secondary {
            feature: WeatherFeature::Alerts,
            source: "dwd".to_string(),
            error: SourceError::Deserialize {
                context: "alerts".to_string(),
                source: parse,
            },
        });
        assert_eq!(err.kind, RefreshErrorKind::SecondaryWeatherFailed);
        assert_eq!(err.source.as_deref(), Some("dwd"));
        assert_eq!(err.feature, Some(WeatherFeature::Alerts));
    }

    #[test]
    fn secondary_transport_failure_keeps_higher_priority_kind() {
        let err = classify(&RefreshFailure::Secondary {
            feature: WeatherFeature::Minutely,
            source: "dwd".to_string(),
            error: status(429, "limit"),
        });
        assert_eq!(err.kind, RefreshErrorKind::ApiLimitReached);
        assert_eq!(err.feature, Some(WeatherFeature::Minutely));
    }

    #[test]
    fn internal_failure_is_data_refresh_failed() {
        let err = classify(&RefreshFailure::Internal("join panicked".to_string()));
        assert_eq!(err.kind, RefreshErrorKind::DataRefreshFailed);
        assert_eq!(err.message(), "join panicked");
    }
}
