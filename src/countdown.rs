use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Span, in days, of the window over which [`progress`] ramps from 0.0 to 1.0
/// when the caller has no better figure.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Remaining time until a target, decomposed for display.
///
/// Hours, minutes and seconds are bounded to their unit (0-23, 0-59, 0-59);
/// days absorbs the overflow. Fields are signed so a non-clamped breakdown
/// can still be expressed by callers that need one (see
/// [`crate::status::resolve`]), but [`remaining`] itself never returns a
/// negative field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    pub const ZERO: Remaining = Remaining {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Remaining::ZERO
    }

    pub fn has_negative_field(&self) -> bool {
        self.days < 0 || self.hours < 0 || self.minutes < 0 || self.seconds < 0
    }
}

/// Break `target - now` down into days/hours/minutes/seconds.
///
/// A target at or behind `now` yields the all-zero breakdown. Truncating
/// integer division throughout, so a 50-hour delta reads as 2 days 2 hours.
pub fn remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let total = (target - now).num_seconds();
    if total <= 0 {
        return Remaining::ZERO;
    }
    Remaining {
        days: total / 86_400,
        hours: (total / 3_600) % 24,
        minutes: (total / 60) % 60,
        seconds: total % 60,
    }
}

/// Fraction of a fixed countdown window already elapsed, clamped to
/// `[0.0, 1.0]`.
///
/// A target already passed reads 1.0; a target further out than `window`
/// reads 0.0. This is a linear display ramp over an arbitrary reference
/// window, not a model of anything physical.
pub fn progress(target: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> f64 {
    let window_secs = window.num_seconds();
    if window_secs <= 0 {
        return 1.0;
    }
    let elapsed = window_secs - (target - now).num_seconds();
    (elapsed as f64 / window_secs as f64).clamp(0.0, 1.0)
}
