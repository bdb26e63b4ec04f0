use crate::config::Config;
use crate::store::KvStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Upper bound on accepted cooldowns. Keeps `reset_at` within chrono's
// representable timestamp range no matter what the header says.
const MAX_COOLDOWN_SECS: u64 = 365 * 86_400;

/// Persisted shape of an observed 429 cooldown. Instants are stored as epoch
/// seconds; any change to this layout is breaking for existing records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct RateLimitRecord {
    reset_at: i64,
    cooldown_seconds: u64,
    observed_at: i64,
}

/// Active cooldown as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub reset_at: DateTime<Utc>,
    pub remaining_seconds: i64,
}

/// Tracks rate-limit backoff across process restarts.
///
/// A single record lives in the injected store under the configured key.
/// Writes are last-429-wins; concurrent observers may race, which is
/// acceptable for a conservative cooldown hint. Reads lazily expire the
/// record, so [`RateLimitTracker::current_cooldown`] is not a pure read.
pub struct RateLimitTracker {
    store: Arc<dyn KvStore>,
    key: String,
    fallback_secs: u64,
}

impl RateLimitTracker {
    pub fn new(store: Arc<dyn KvStore>, cfg: &Config) -> Self {
        Self {
            store,
            key: cfg.rate_limit_key.clone(),
            fallback_secs: cfg.fallback_cooldown_secs,
        }
    }

    /// Record a cooldown if `status` is 429; any other status is a no-op.
    ///
    /// `retry_after` is the raw `Retry-After` header value, read as a
    /// non-negative whole number of seconds, capped at one year. A missing
    /// or malformed header falls back to the configured default cooldown.
    pub fn on_response(&self, status: u16, retry_after: Option<&str>, now: DateTime<Utc>) {
        if status != StatusCode::TOO_MANY_REQUESTS.as_u16() {
            return;
        }
        let cooldown_seconds = match retry_after {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => {
                    warn!(
                        "unparsable Retry-After {:?}; falling back to {}s",
                        raw, self.fallback_secs
                    );
                    self.fallback_secs
                }
            },
            None => self.fallback_secs,
        };
        let cooldown_seconds = if cooldown_seconds > MAX_COOLDOWN_SECS {
            warn!(
                "capping cooldown of {}s to {}s",
                cooldown_seconds, MAX_COOLDOWN_SECS
            );
            MAX_COOLDOWN_SECS
        } else {
            cooldown_seconds
        };
        let record = RateLimitRecord {
            reset_at: now.timestamp().saturating_add(cooldown_seconds as i64),
            cooldown_seconds,
            observed_at: now.timestamp(),
        };
        debug!("rate limited until epoch {}", record.reset_at);
        match serde_json::to_string(&record) {
            Ok(json) => self.store.set(&self.key, &json),
            Err(e) => warn!("failed to serialize rate-limit record: {}", e),
        }
    }

    /// Observe a completed HTTP exchange, pulling `Retry-After` out of the
    /// response headers.
    pub fn observe(&self, status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) {
        let retry_after = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok());
        self.on_response(status.as_u16(), retry_after, now);
    }

    /// Read the active cooldown, expiring a stale record in the same step.
    ///
    /// Returns `None` when no record exists or the deadline has passed; an
    /// expired record is deleted before returning. Remaining time rounds up,
    /// so one millisecond short of the deadline still reports a full second.
    pub fn current_cooldown(&self, now: DateTime<Utc>) -> Option<Cooldown> {
        let json = self.store.get(&self.key)?;
        let record: RateLimitRecord = match serde_json::from_str(&json) {
            Ok(r) => r,
            Err(e) => {
                warn!("dropping unreadable rate-limit record: {}", e);
                self.store.remove(&self.key);
                return None;
            }
        };
        let reset_at = match DateTime::<Utc>::from_timestamp(record.reset_at, 0) {
            Some(dt) => dt,
            None => {
                warn!(
                    "dropping rate-limit record with unrepresentable reset_at {}",
                    record.reset_at
                );
                self.store.remove(&self.key);
                return None;
            }
        };
        let remaining_ms = record.reset_at * 1_000 - now.timestamp_millis();
        if remaining_ms <= 0 {
            self.store.remove(&self.key);
            return None;
        }
        Some(Cooldown {
            reset_at,
            remaining_seconds: (remaining_ms + 999) / 1_000,
        })
    }

    /// Drop any persisted cooldown. Idempotent.
    pub fn clear(&self) {
        self.store.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn tracker() -> (RateLimitTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let t = RateLimitTracker::new(store.clone(), &Config::default());
        (t, store)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn non_429_is_a_no_op() {
        let (t, store) = tracker();
        t.on_response(200, Some("120"), t0());
        t.on_response(503, None, t0());
        assert!(store.get("rate_limit/backoff").is_none());
        assert_eq!(t.current_cooldown(t0()), None);
    }

    #[test]
    fn retry_after_header_sets_the_deadline() {
        let (t, _) = tracker();
        t.on_response(429, Some("120"), t0());
        let cd = t.current_cooldown(t0()).unwrap();
        assert_eq!(cd.remaining_seconds, 120);
        assert_eq!(cd.reset_at, t0() + Duration::seconds(120));
    }

    #[test]
    fn missing_or_malformed_header_uses_fallback() {
        let (t, _) = tracker();
        t.on_response(429, None, t0());
        assert_eq!(t.current_cooldown(t0()).unwrap().remaining_seconds, 36_000);

        let (t, _) = tracker();
        t.on_response(429, Some("soonish"), t0());
        assert_eq!(t.current_cooldown(t0()).unwrap().remaining_seconds, 36_000);
    }

    #[test]
    fn lazy_expiry_deletes_on_read() {
        let (t, store) = tracker();
        t.on_response(429, None, t0());
        let just_before = t0() + Duration::seconds(36_000) - Duration::seconds(1);
        assert_eq!(t.current_cooldown(just_before).unwrap().remaining_seconds, 1);

        let at_deadline = t0() + Duration::seconds(36_000);
        assert_eq!(t.current_cooldown(at_deadline), None);
        assert!(store.get("rate_limit/backoff").is_none());
        // later reads stay empty
        assert_eq!(t.current_cooldown(at_deadline + Duration::hours(1)), None);
    }

    #[test]
    fn remaining_rounds_up_sub_second_gaps() {
        let (t, _) = tracker();
        t.on_response(429, Some("10"), t0());
        let late = t0() + Duration::seconds(9) + Duration::milliseconds(500);
        assert_eq!(t.current_cooldown(late).unwrap().remaining_seconds, 1);
    }

    #[test]
    fn last_429_wins() {
        let (t, _) = tracker();
        t.on_response(429, Some("600"), t0());
        t.on_response(429, Some("30"), t0() + Duration::seconds(5));
        let cd = t.current_cooldown(t0() + Duration::seconds(5)).unwrap();
        assert_eq!(cd.remaining_seconds, 30);
    }

    #[test]
    fn clear_is_idempotent() {
        let (t, _) = tracker();
        t.on_response(429, Some("60"), t0());
        t.clear();
        assert_eq!(t.current_cooldown(t0()), None);
        t.clear();
    }

    #[test]
    fn observe_reads_retry_after_from_headers() {
        let (t, _) = tracker();
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "42".parse().unwrap());
        t.observe(StatusCode::TOO_MANY_REQUESTS, &headers, t0());
        assert_eq!(t.current_cooldown(t0()).unwrap().remaining_seconds, 42);
    }

    #[test]
    fn record_survives_a_new_tracker_over_the_same_store() {
        let store = Arc::new(MemoryStore::new());
        let cfg = Config::default();
        let first = RateLimitTracker::new(store.clone(), &cfg);
        first.on_response(429, Some("300"), t0());
        drop(first);

        let second = RateLimitTracker::new(store, &cfg);
        let cd = second.current_cooldown(t0() + Duration::seconds(100)).unwrap();
        assert_eq!(cd.remaining_seconds, 200);
    }

    #[test]
    fn oversized_retry_after_is_capped() {
        // fits in u64 but would push reset_at past chrono's range
        let (t, _) = tracker();
        t.on_response(429, Some("10000000000000000"), t0());
        let cd = t.current_cooldown(t0()).expect("active cooldown");
        assert_eq!(cd.remaining_seconds, MAX_COOLDOWN_SECS as i64);

        // would wrap negative if cast to i64 unchecked
        let (t, _) = tracker();
        t.on_response(429, Some("18000000000000000000"), t0());
        let cd = t.current_cooldown(t0()).expect("active cooldown");
        assert_eq!(cd.remaining_seconds, MAX_COOLDOWN_SECS as i64);
        assert_eq!(cd.reset_at, t0() + Duration::seconds(MAX_COOLDOWN_SECS as i64));
    }

    #[test]
    fn unrepresentable_reset_at_is_dropped() {
        let (t, store) = tracker();
        store.set(
            "rate_limit/backoff",
            r#"{"reset_at":9223372036854775807,"cooldown_seconds":1,"observed_at":0}"#,
        );
        assert_eq!(t.current_cooldown(t0()), None);
        assert!(store.get("rate_limit/backoff").is_none());
    }

    #[test]
    fn unreadable_record_is_dropped() {
        let (t, store) = tracker();
        store.set("rate_limit/backoff", "{not json");
        assert_eq!(t.current_cooldown(t0()), None);
        assert!(store.get("rate_limit/backoff").is_none());
    }
}
