//! Engine configuration.
//!
//! Every setting has a default suitable for local use and can be overridden
//! through the environment:
//!
//! | Variable                        | Default         |
//! |---------------------------------|-----------------|
//! | `LEADERBOARD_KEY_PREFIX`        | `lb:distance:`  |
//! | `LEADERBOARD_DEDUP_PREFIX`      | `lb:dedup:`     |
//! | `LEADERBOARD_DEDUP_TTL_SECS`    | 7 days          |
//! | `LEADERBOARD_CLAIM_PREFIX`      | `idem:`         |
//! | `LEADERBOARD_CLAIM_TTL_SECS`    | 10 minutes      |
//! | `LEADERBOARD_STORE_TIMEOUT_MS`  | 2000            |
//! | `PORT`                          | 3000            |

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default prefix for ranked aggregate keys.
const DEFAULT_KEY_PREFIX: &str = "lb:distance:";

/// Default prefix for per-event dedup markers.
const DEFAULT_DEDUP_PREFIX: &str = "lb:dedup:";

/// Default lifetime of a dedup marker (7 days).
const DEFAULT_DEDUP_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default prefix for reservation records.
const DEFAULT_CLAIM_PREFIX: &str = "idem:";

/// Default lifetime of a reservation record (10 minutes).
const DEFAULT_CLAIM_TTL_SECS: u64 = 10 * 60;

/// Default deadline for one store round trip.
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

const DEFAULT_PORT: u16 = 3000;

/// Configuration shared by the guard, the board, and the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix of every ranked aggregate key.
    pub key_prefix: String,

    /// Prefix of every dedup marker key.
    pub dedup_prefix: String,

    /// How long a dedup marker suppresses redelivery of the same event.
    ///
    /// After this window an event id may be applied again.
    pub dedup_ttl: Duration,

    /// Prefix of every reservation record key.
    pub claim_prefix: String,

    /// Lifetime of a reservation, both while pending and after completion.
    pub claim_ttl: Duration,

    /// Deadline for a single store round trip. An elapsed deadline is an
    /// ambiguous outcome, not a failure.
    pub store_timeout: Duration,

    /// HTTP listen port.
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        EngineConfig {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            dedup_prefix: DEFAULT_DEDUP_PREFIX.to_string(),
            dedup_ttl: Duration::from_secs(DEFAULT_DEDUP_TTL_SECS),
            claim_prefix: DEFAULT_CLAIM_PREFIX.to_string(),
            claim_ttl: Duration::from_secs(DEFAULT_CLAIM_TTL_SECS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            port: DEFAULT_PORT,
        }
    }

    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();
        let text = |name: &str, default: String| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        EngineConfig {
            key_prefix: text("LEADERBOARD_KEY_PREFIX", defaults.key_prefix),
            dedup_prefix: text("LEADERBOARD_DEDUP_PREFIX", defaults.dedup_prefix),
            dedup_ttl: parsed(&lookup, "LEADERBOARD_DEDUP_TTL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.dedup_ttl),
            claim_prefix: text("LEADERBOARD_CLAIM_PREFIX", defaults.claim_prefix),
            claim_ttl: parsed(&lookup, "LEADERBOARD_CLAIM_TTL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_ttl),
            store_timeout: parsed(&lookup, "LEADERBOARD_STORE_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
        }
    }

    /// Overrides the prefix of aggregate keys.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Overrides how long a dedup marker suppresses redelivery.
    pub fn with_dedup_ttl(mut self, ttl: Duration) -> Self {
        self.dedup_ttl = ttl;
        self
    }

    /// Overrides the lifetime of an idempotency claim.
    pub fn with_claim_ttl(mut self, ttl: Duration) -> Self {
        self.claim_ttl = ttl;
        self
    }

    /// Overrides the deadline applied to each store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
