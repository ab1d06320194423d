//! Per-location unit of work: freshness check, optional current-position
//! re-resolution, primary fetch, secondary-feature fetches, and failure
//! containment. Every error is converted into a `Failed` outcome here; only
//! cancellation escapes (as `None`).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use skysync_core::{should_skip, Location, Weather, WeatherFeature};
use skysync_sources::{SourceError, SourceRegistry, WeatherSource};

use crate::classify::{classify, RefreshFailure};
use crate::outcome::RefreshOutcome;
use crate::store::CurrentPositionResolver;

pub(crate) const SKIP_REASON_FRESH: &str = "already recently updated";

/// Secondary features the snapshot can represent and merge. Air quality,
/// pollen, and normals stay configuration-only: their scaling lives outside
/// this engine.
const MERGEABLE_FEATURES: [WeatherFeature; 3] = [
    WeatherFeature::Current,
    WeatherFeature::Minutely,
    WeatherFeature::Alerts,
];

pub(crate) struct WorkerContext<'a> {
    pub resolver: &'a dyn CurrentPositionResolver,
    pub registry: &'a SourceRegistry,
    /// The group's primary source client, resolved once at batch start.
    /// `None` means the configured source id is not registered.
    pub primary: Option<&'a Arc<dyn WeatherSource>>,
    pub validity_hours: f32,
    pub ignore_freshness: bool,
    pub cancel: &'a CancellationToken,
}

/// Refreshes one location. Returns `None` only when the batch was cancelled
/// mid-flight; otherwise exactly one [`RefreshOutcome`].
pub(crate) async fn refresh_location(
    ctx: &WorkerContext<'_>,
    location: Location,
) -> Option<RefreshOutcome> {
    if ctx.cancel.is_cancelled() {
        return None;
    }

    if should_skip(
        location.weather.as_ref(),
        ctx.validity_hours,
        ctx.ignore_freshness,
    ) {
        tracing::debug!(
            location = %location.formatted_id,
            "skipping refresh, snapshot is still fresh"
        );
        return Some(RefreshOutcome::Skipped {
            location,
            reason: SKIP_REASON_FRESH.to_string(),
        });
    }

    let resolved = if location.is_current_position {
        match ctx.resolver.resolve(&location).await {
            Ok(resolved) => resolved,
            Err(err) if location.is_usable() => {
                // Stale-but-usable coordinates must not block a weather
                // refresh; the resolution failure stays invisible to the
                // user.
                tracing::debug!(
                    location = %location.formatted_id,
                    error = %err,
                    "current position resolution failed, keeping last known coordinates"
                );
                location.clone()
            }
            Err(err) => {
                return Some(RefreshOutcome::Failed {
                    error: classify(&RefreshFailure::Locate(err)),
                    location,
                });
            }
        }
    } else {
        location.clone()
    };

    if ctx.cancel.is_cancelled() {
        return None;
    }

    let Some(primary) = ctx.primary else {
        let error = classify(&RefreshFailure::Source(SourceError::NotInstalled {
            source_id: location.weather_source.clone(),
        }))
        .with_source(location.weather_source.clone());
        return Some(RefreshOutcome::Failed { location, error });
    };

    let mut weather = match primary.fetch(&resolved, &primary_features(&resolved)).await {
        Ok(weather) => weather,
        Err(err) => {
            let error = classify(&RefreshFailure::Source(err))
                .with_source(location.weather_source.clone());
            return Some(RefreshOutcome::Failed { location, error });
        }
    };

    if ctx.cancel.is_cancelled() {
        return None;
    }

    for (feature, source_id) in secondary_fetches(&resolved) {
        let Some(secondary) = ctx.registry.get(&source_id) else {
            let error = classify(&RefreshFailure::Secondary {
                feature,
                source: source_id.clone(),
                error: SourceError::NotInstalled { source_id },
            });
            return Some(RefreshOutcome::Failed { location, error });
        };
        match secondary.fetch(&resolved, &[feature]).await {
            Ok(fetched) => merge_feature(&mut weather, feature, fetched),
            Err(err) => {
                let error = classify(&RefreshFailure::Secondary {
                    feature,
                    source: source_id,
                    error: err,
                });
                return Some(RefreshOutcome::Failed { location, error });
            }
        }
        if ctx.cancel.is_cancelled() {
            return None;
        }
    }

    Some(RefreshOutcome::Updated {
        after: resolved.with_weather(weather),
        before: location,
    })
}

/// Mergeable features the primary source should serve itself, i.e. those
/// without a secondary override.
fn primary_features(location: &Location) -> Vec<WeatherFeature> {
    MERGEABLE_FEATURES
        .into_iter()
        .filter(|f| location.secondary_sources.for_feature(*f).is_none())
        .collect()
}

/// `(feature, source_id)` pairs to fetch from secondary sources, limited to
/// features the snapshot can merge and sources other than the primary one.
fn secondary_fetches(location: &Location) -> Vec<(WeatherFeature, String)> {
    location
        .secondary_sources
        .configured()
        .into_iter()
        .filter(|(feature, source_id)| {
            MERGEABLE_FEATURES.contains(feature) && *source_id != location.weather_source
        })
        .map(|(feature, source_id)| (feature, source_id.to_string()))
        .collect()
}

fn merge_feature(weather: &mut Weather, feature: WeatherFeature, fetched: Weather) {
    match feature {
        WeatherFeature::Current => {
            if fetched.current.is_some() {
                weather.current = fetched.current;
            }
        }
        WeatherFeature::Minutely => weather.minutely = fetched.minutely,
        WeatherFeature::Alerts => weather.alerts = fetched.alerts,
        WeatherFeature::AirQuality | WeatherFeature::Pollen | WeatherFeature::Normals => {}
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use skysync_core::{RefreshErrorKind, SecondarySources};

    use super::*;
    use crate::store::LocateError;

    fn fixed_location(id: &str) -> Location {
        Location {
            formatted_id: id.to_string(),
            display_name: id.to_string(),
            latitude: 52.52,
            longitude: 13.405,
            is_current_position: false,
            weather_source: "openmeteo".to_string(),
            secondary_sources: SecondarySources::default(),
            weather: None,
        }
    }

    struct OkResolver;

    #[async_trait]
    impl CurrentPositionResolver for OkResolver {
        async fn resolve(&self, location: &Location) -> Result<Location, LocateError> {
            Ok(location.with_coordinates(48.8, 2.35, "Paris".to_string()))
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl CurrentPositionResolver for FailingResolver {
        async fn resolve(&self, _location: &Location) -> Result<Location, LocateError> {
            Err(LocateError::Failed("gps off".to_string()))
        }
    }

    enum FetchPlan {
        Succeed,
        RateLimited,
    }

    struct PlannedSource {
        id: String,
        plan: FetchPlan,
    }

    #[async_trait]
    impl WeatherSource for PlannedSource {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.id
        }

        async fn fetch(
            &self,
            _location: &Location,
            _features: &[WeatherFeature],
        ) -> Result<Weather, SourceError> {
            match self.plan {
                FetchPlan::Succeed => Ok(Weather::empty(Utc::now())),
                FetchPlan::RateLimited => Err(SourceError::RateLimited {
                    retry_after_secs: None,
                }),
            }
        }
    }

    fn source(id: &str, plan: FetchPlan) -> Arc<dyn WeatherSource> {
        Arc::new(PlannedSource {
            id: id.to_string(),
            plan,
        })
    }

    fn context<'a>(
        resolver: &'a dyn CurrentPositionResolver,
        registry: &'a SourceRegistry,
        primary: Option<&'a Arc<dyn WeatherSource>>,
        cancel: &'a CancellationToken,
    ) -> WorkerContext<'a> {
        WorkerContext {
            resolver,
            registry,
            primary,
            validity_hours: 0.25,
            ignore_freshness: false,
            cancel,
        }
    }

    #[tokio::test]
    async fn fresh_snapshot_is_skipped_without_fetching() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&OkResolver, &registry, Some(&primary), &cancel);

        let mut location = fixed_location("a");
        location.weather = Some(Weather::empty(Utc::now() - Duration::minutes(5)));

        let outcome = refresh_location(&ctx, location).await.unwrap();
        assert!(
            matches!(outcome, RefreshOutcome::Skipped { ref reason, .. } if reason == SKIP_REASON_FRESH),
            "expected Skipped, got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn stale_snapshot_is_refreshed() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&OkResolver, &registry, Some(&primary), &cancel);

        let mut location = fixed_location("a");
        location.weather = Some(Weather::empty(Utc::now() - Duration::hours(2)));

        let outcome = refresh_location(&ctx, location).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    }

    #[tokio::test]
    async fn resolution_failure_with_usable_prior_data_still_updates() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&FailingResolver, &registry, Some(&primary), &cancel);

        let mut location = fixed_location("current");
        location.is_current_position = true;

        let outcome = refresh_location(&ctx, location).await.unwrap();
        match outcome {
            RefreshOutcome::Updated { before, after } => {
                // Fell back to last-known coordinates, then fetched fresh
                // weather.
                assert!((after.latitude - before.latitude).abs() < f64::EPSILON);
                assert!(after.weather.is_some());
            }
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolution_failure_without_usable_data_fails_as_location_error() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&FailingResolver, &registry, Some(&primary), &cancel);

        let mut location = fixed_location("current");
        location.is_current_position = true;
        location.latitude = 0.0;
        location.longitude = 0.0;

        let outcome = refresh_location(&ctx, location).await.unwrap();
        match outcome {
            RefreshOutcome::Failed { error, .. } => {
                assert_eq!(error.kind, RefreshErrorKind::LocationFailed);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_primary_source_fails_as_not_installed() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let ctx = context(&OkResolver, &registry, None, &cancel);

        let outcome = refresh_location(&ctx, fixed_location("a")).await.unwrap();
        match outcome {
            RefreshOutcome::Failed { error, .. } => {
                assert_eq!(error.kind, RefreshErrorKind::SourceNotInstalled);
                assert_eq!(error.source.as_deref(), Some("openmeteo"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn primary_fetch_failure_is_classified() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::RateLimited);
        let ctx = context(&OkResolver, &registry, Some(&primary), &cancel);

        let outcome = refresh_location(&ctx, fixed_location("a")).await.unwrap();
        match outcome {
            RefreshOutcome::Failed { error, .. } => {
                assert_eq!(error.kind, RefreshErrorKind::ApiLimitReached);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn secondary_failure_is_classified_with_feature_context() {
        let mut registry = SourceRegistry::new();
        registry.register(source("dwd", FetchPlan::RateLimited));
        let cancel = CancellationToken::new();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&OkResolver, &registry, Some(&primary), &cancel);

        let mut location = fixed_location("a");
        location.secondary_sources.alerts = Some("dwd".to_string());

        let outcome = refresh_location(&ctx, location).await.unwrap();
        match outcome {
            RefreshOutcome::Failed { error, .. } => {
                assert_eq!(error.kind, RefreshErrorKind::ApiLimitReached);
                assert_eq!(error.feature, Some(WeatherFeature::Alerts));
                assert_eq!(error.source.as_deref(), Some("dwd"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_batch_abandons_before_starting() {
        let registry = SourceRegistry::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let primary = source("openmeteo", FetchPlan::Succeed);
        let ctx = context(&OkResolver, &registry, Some(&primary), &cancel);

        let outcome = refresh_location(&ctx, fixed_location("a")).await;
        assert!(outcome.is_none());
    }

    #[test]
    fn secondary_fetches_ignore_unmergeable_features_and_primary_source() {
        let mut location = fixed_location("a");
        location.secondary_sources.alerts = Some("dwd".to_string());
        location.secondary_sources.pollen = Some("dwd".to_string());
        location.secondary_sources.minutely = Some("openmeteo".to_string());

        let fetches = secondary_fetches(&location);
        assert_eq!(fetches, vec![(WeatherFeature::Alerts, "dwd".to_string())]);
    }

    #[test]
    fn primary_features_exclude_overridden_ones() {
        let mut location = fixed_location("a");
        location.secondary_sources.alerts = Some("dwd".to_string());
        let features = primary_features(&location);
        assert!(features.contains(&WeatherFeature::Current));
        assert!(features.contains(&WeatherFeature::Minutely));
        assert!(!features.contains(&WeatherFeature::Alerts));
    }
}
