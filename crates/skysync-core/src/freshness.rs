//! Staleness policy for the automatic-skip check during batch refresh.
//!
//! A snapshot is fresh when it is younger than the validity window. The
//! window used by batch refresh is fixed at 15 minutes regardless of the
//! user's polling interval, which governs job scheduling only.

use chrono::{DateTime, Utc};

use crate::weather::Weather;

/// Validity window applied by batch refresh, in hours (15 minutes).
pub const DEFAULT_VALIDITY_HOURS: f32 = 0.25;

/// Whether a refresh for a location holding `weather` should be skipped.
///
/// Never skips when the snapshot is absent or when `ignore_freshness` is set
/// (the caller-controlled development override). A snapshot stamped in the
/// future is treated as invalid and never skipped.
#[must_use]
pub fn should_skip(weather: Option<&Weather>, validity_hours: f32, ignore_freshness: bool) -> bool {
    should_skip_at(Utc::now(), weather, validity_hours, ignore_freshness)
}

/// [`should_skip`] with an injected clock, for tests.
#[must_use]
pub fn should_skip_at(
    now: DateTime<Utc>,
    weather: Option<&Weather>,
    validity_hours: f32,
    ignore_freshness: bool,
) -> bool {
    if ignore_freshness {
        return false;
    }
    let Some(weather) = weather else {
        return false;
    };
    if weather.updated_at > now {
        return false;
    }
    let age_ms = (now - weather.updated_at).num_milliseconds();
    let window_ms = f64::from(validity_hours) * 3_600_000.0;
    #[allow(clippy::cast_precision_loss)]
    let fresh = (age_ms as f64) < window_ms;
    fresh
}
