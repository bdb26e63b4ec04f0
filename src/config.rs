use std::env;

/// Fallback cooldown applied when a 429 arrives without a usable
/// `Retry-After` header. Ten hours is unusually long for an API backoff and
/// is preserved from the upstream client deliberately; override it via
/// `LIFTOFF_RATE_LIMIT_FALLBACK_SECS` before trusting it in a new deployment.
pub const DEFAULT_FALLBACK_COOLDOWN_SECS: u64 = 36_000;

/// Runtime configuration for the countdown and rate-limit core.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub window_days: i64,
    pub fallback_cooldown_secs: u64,
    pub rate_limit_key: String,
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - LIFTOFF_WINDOW_DAYS (default: 30)
    /// - LIFTOFF_RATE_LIMIT_FALLBACK_SECS (default: 36000)
    /// - LIFTOFF_RATE_LIMIT_KEY (default: rate_limit/backoff)
    pub fn from_env() -> Self {
        let window_days = env::var("LIFTOFF_WINDOW_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(crate::countdown::DEFAULT_WINDOW_DAYS);
        let fallback_cooldown_secs = env::var("LIFTOFF_RATE_LIMIT_FALLBACK_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FALLBACK_COOLDOWN_SECS);
        let rate_limit_key = env::var("LIFTOFF_RATE_LIMIT_KEY")
            .unwrap_or_else(|_| "rate_limit/backoff".to_string());

        Self {
            window_days,
            fallback_cooldown_secs,
            rate_limit_key,
        }
    }

    /// The configured countdown window as a duration, for feeding
    /// [`crate::countdown::progress`].
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.window_days)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_days: crate::countdown::DEFAULT_WINDOW_DAYS,
            fallback_cooldown_secs: DEFAULT_FALLBACK_COOLDOWN_SECS,
            rate_limit_key: "rate_limit/backoff".to_string(),
        }
    }
}
