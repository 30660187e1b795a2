//! Scope parsing and (scope, date) → aggregate key resolution.
//!
//! ```text
//! all-time  <prefix>all-time                 no expiry
//! weekly    <prefix>weekly:<ISO year>-W<ww>  26 weeks after first write
//! daily     <prefix>daily:<YYYY-MM-DD>       35 days after first write
//! ```
//!
//! Weeks are ISO weeks (Monday start) labelled with the ISO week-based year,
//! so 2024-12-30 belongs to `2025-W01`.
//!
//! Dedup keys are `<dedup prefix><scope>:<event>`. They name the scope, not
//! the window, so a redelivery after midnight (or after Monday 00:00) still
//! finds the marker written for the previous window.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::types::{AggregateKey, DedupKey, EventId};

/// Retention of a weekly aggregate.
pub const WEEKLY_RETENTION: Duration = Duration::from_secs(26 * 7 * 24 * 60 * 60);

/// Retention of a daily aggregate.
pub const DAILY_RETENTION: Duration = Duration::from_secs(35 * 24 * 60 * 60);

/// A ranking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Scope {
    AllTime,
    Weekly,
    Daily,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::AllTime => "all-time",
            Scope::Weekly => "weekly",
            Scope::Daily => "daily",
        }
    }

    /// How long an aggregate of this scope lives after its first write.
    pub fn retention(self) -> Option<Duration> {
        match self {
            Scope::AllTime => None,
            Scope::Weekly => Some(WEEKLY_RETENTION),
            Scope::Daily => Some(DAILY_RETENTION),
        }
    }

    /// The key suffix identifying this scope's window containing `date`.
    pub fn window(self, date: NaiveDate) -> String {
        match self {
            Scope::AllTime => "all-time".to_string(),
            Scope::Weekly => {
                let week = date.iso_week();
                format!("weekly:{}-W{:02}", week.year(), week.week())
            }
            Scope::Daily => format!("daily:{}", date.format("%Y-%m-%d")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all-time" | "alltime" => Ok(Scope::AllTime),
            "weekly" => Ok(Scope::Weekly),
            "daily" => Ok(Scope::Daily),
            _ => Err(ValidationError::UnknownScope(s.to_string())),
        }
    }
}

impl TryFrom<String> for Scope {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A scope bound to the aggregate key for one reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub scope: Scope,
    pub key: AggregateKey,
    pub retention: Option<Duration>,
}

/// Builds aggregate and dedup keys from the configured prefixes.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    key_prefix: String,
    dedup_prefix: String,
}

impl KeyResolver {
    pub fn new(config: &EngineConfig) -> Self {
        KeyResolver {
            key_prefix: config.key_prefix.clone(),
            dedup_prefix: config.dedup_prefix.clone(),
        }
    }

    /// Resolves `scope` to its aggregate for the window containing `date`.
    pub fn resolve(&self, scope: Scope, date: NaiveDate) -> ResolvedKey {
        ResolvedKey {
            scope,
            key: AggregateKey(format!("{}{}", self.key_prefix, scope.window(date))),
            retention: scope.retention(),
        }
    }

    /// Dedup key for applying `event` to `scope`.
    ///
    /// One marker per scope, shared by every window of that scope.
    pub fn dedup_key(&self, scope: Scope, event: &EventId) -> DedupKey {
        DedupKey(format!("{}{}:{}", self.dedup_prefix, scope, event))
    }
}
