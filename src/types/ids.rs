//! Newtype wrappers for identifiers.
//!
//! Caller-supplied identifiers ([`ActorId`], [`EventId`], [`ClaimKey`]) are
//! validated on construction so that a blank value can never reach the store.
//! Store-side keys ([`AggregateKey`], [`DedupKey`]) are only built by the key
//! resolver and carry no validation of their own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

fn non_blank(raw: String, field: &'static str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        Err(ValidationError::Blank { field })
    } else {
        Ok(raw)
    }
}

/// The member identity ranked on a leaderboard (a user or runner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Parses an actor id, rejecting blank input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        non_blank(raw.into(), "actor_id").map(ActorId)
    }

    /// Wraps a member name read back from a ranked aggregate. Members only
    /// get there through [`ActorId::parse`].
    pub(crate) fn from_member(member: String) -> Self {
        ActorId(member)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The externally supplied identifier of one logical progress event.
///
/// Redelivery of the same event carries the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Parses an event id, rejecting blank input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        non_blank(raw.into(), "event_id").map(EventId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A caller-chosen key for single-key claim-and-complete (e.g. an
/// `Idempotency-Key` header).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimKey(String);

impl ClaimKey {
    /// Parses a claim key, rejecting blank input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        non_blank(raw.into(), "claim_key").map(ClaimKey)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The store key of one ranked aggregate, e.g. `lb:distance:weekly:2025-W37`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateKey(pub String);

impl AggregateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The store key of a dedup marker for one (aggregate, event) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupKey(pub String);

impl DedupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod validated {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn non_blank_ids_are_accepted_verbatim(s in "[a-zA-Z0-9_-]{1,40}") {
                let actor = ActorId::parse(s.clone()).unwrap();
                let event = EventId::parse(s.clone()).unwrap();
                let claim = ClaimKey::parse(s.clone()).unwrap();
                prop_assert_eq!(actor.as_str(), s.as_str());
                prop_assert_eq!(event.as_str(), s.as_str());
                prop_assert_eq!(claim.as_str(), s.as_str());
            }

            #[test]
            fn whitespace_only_ids_are_rejected(s in "[ \t\n]{0,10}") {
                prop_assert_eq!(
                    ActorId::parse(s.clone()),
                    Err(ValidationError::Blank { field: "actor_id" })
                );
                prop_assert_eq!(
                    EventId::parse(s.clone()),
                    Err(ValidationError::Blank { field: "event_id" })
                );
                prop_assert_eq!(
                    ClaimKey::parse(s),
                    Err(ValidationError::Blank { field: "claim_key" })
                );
            }
        }
    }

    #[test]
    fn ids_serialize_transparently() {
        let actor = ActorId::parse("u1").unwrap();
        assert_eq!(serde_json::to_string(&actor).unwrap(), "\"u1\"");

        let parsed: EventId = serde_json::from_str("\"ev-1\"").unwrap();
        assert_eq!(parsed.as_str(), "ev-1");
    }

    #[test]
    fn store_keys_display_raw() {
        let key = AggregateKey("lb:distance:all-time".to_string());
        assert_eq!(key.to_string(), "lb:distance:all-time");
        let dedup = DedupKey("lb:dedup:x:ev1".to_string());
        assert_eq!(dedup.as_str(), "lb:dedup:x:ev1");
    }
}
