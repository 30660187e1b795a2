//! Core identifier types shared by the store, the guard, and the service.

pub mod ids;

pub use ids::{ActorId, AggregateKey, ClaimKey, DedupKey, EventId};
