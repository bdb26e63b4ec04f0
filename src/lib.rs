//! Time-and-state core for launch-tracking clients: countdown breakdowns,
//! lifecycle status derivation, upstream date parsing, and a persisted
//! rate-limit backoff tracker. Rendering, scheduling, and transport live in
//! the calling application.

pub mod config;
pub mod countdown;
pub mod dates;
pub mod rate_limit;
pub mod status;
pub mod store;

pub use config::Config;
pub use countdown::{progress, remaining, Remaining, DEFAULT_WINDOW_DAYS};
pub use dates::{parse, ParseError, ParsedDate};
pub use rate_limit::{Cooldown, RateLimitTracker};
pub use status::{resolve, CountdownStatus};
pub use store::{KvStore, MemoryStore};
