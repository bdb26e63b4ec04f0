use crate::countdown::Remaining;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a tracked launch at a given evaluation instant.
/// Derived on demand from a [`Remaining`] breakdown; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStatus {
    Counting,
    Live,
    Launched,
    Overdue,
}

/// Derive the countdown status from a breakdown and the upstream live flag.
///
/// Rules apply in order: any negative field means `Overdue`, all-zero means
/// `Launched`, a live webcast means `Live`, otherwise `Counting`.
///
/// `Overdue` only fires for a raw, non-clamped breakdown;
/// [`crate::countdown::remaining`] clamps at zero, so callers feeding it
/// directly never see that variant. The rule is kept first for callers that
/// compute their own deltas.
pub fn resolve(remaining: &Remaining, is_live: bool) -> CountdownStatus {
    if remaining.has_negative_field() {
        CountdownStatus::Overdue
    } else if remaining.is_zero() {
        CountdownStatus::Launched
    } else if is_live {
        CountdownStatus::Live
    } else {
        CountdownStatus::Counting
    }
}
