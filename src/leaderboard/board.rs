//! Per-aggregate operations against the store.
//!
//! Each method is exactly one store round trip under the configured deadline.
//! Rank positions are 0-based.

use std::time::Duration;

use super::model::{RankScore, RankedEntry};
use crate::config::EngineConfig;
use crate::store::{
    IncrementOnce, IncrementOutcome, KeyTtl, OrderedStore, ScoredMember, StoreError,
    with_deadline,
};
use crate::types::{ActorId, AggregateKey, DedupKey};

/// Typed access to the ranked aggregates of one store.
///
/// Keys come in already resolved; this layer only maps store replies onto
/// leaderboard shapes and applies the call deadline.
#[derive(Debug, Clone)]
pub struct RankedBoard<S> {
    store: S,
    deadline: Duration,
}

fn entries(start_rank: u64, members: Vec<ScoredMember>) -> Vec<RankedEntry> {
    members
        .into_iter()
        .zip(start_rank..)
        .map(|(m, rank)| RankedEntry {
            rank,
            actor_id: ActorId::from_member(m.member),
            score: m.score,
        })
        .collect()
}

fn rank_as_i64(rank: u64) -> i64 {
    i64::try_from(rank).unwrap_or(i64::MAX)
}

impl<S: OrderedStore> RankedBoard<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        RankedBoard {
            store,
            deadline: config.store_timeout,
        }
    }

    /// Adds `delta` to `member` unless `dedup` has already been recorded.
    ///
    /// The check and the increment happen in one atomic store step. When the
    /// event is a duplicate nothing changes and the current total comes back
    /// with `applied == false`. A `retention` is attached to the aggregate in
    /// that same step if it has no deadline yet.
    pub async fn increment_once(
        &self,
        aggregate: &AggregateKey,
        dedup: &DedupKey,
        member: &ActorId,
        delta: f64,
        dedup_ttl: Duration,
        retention: Option<Duration>,
    ) -> Result<IncrementOutcome, StoreError> {
        let request = IncrementOnce {
            aggregate_key: aggregate.as_str(),
            dedup_key: dedup.as_str(),
            member: member.as_str(),
            delta,
            dedup_ttl,
            retention,
        };
        with_deadline(
            self.deadline,
            "INCREMENT_ONCE",
            aggregate.as_str(),
            self.store.increment_once(request),
        )
        .await
    }

    /// The `n` highest entries, best first. Fewer if the board is smaller.
    pub async fn top_n(&self, aggregate: &AggregateKey, n: u64) -> Result<Vec<RankedEntry>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let key = aggregate.as_str();
        let members = with_deadline(
            self.deadline,
            "REV_RANGE",
            key,
            self.store.rev_range(key, 0, n - 1),
        )
        .await?;
        Ok(entries(0, members))
    }

    pub async fn rank_and_score(
        &self,
        aggregate: &AggregateKey,
        member: &ActorId,
    ) -> Result<RankScore, StoreError> {
        let key = aggregate.as_str();
        let standing = with_deadline(
            self.deadline,
            "REV_RANK_SCORE",
            key,
            self.store.rev_rank_and_score(key, member.as_str()),
        )
        .await?;
        Ok(match standing {
            Some((rank, score)) => RankScore {
                rank: rank_as_i64(rank),
                score,
            },
            None => RankScore::ABSENT,
        })
    }

    /// Up to `radius` entries either side of `member`, clipped at both ends.
    /// Empty if the member is not on the board.
    pub async fn around(
        &self,
        aggregate: &AggregateKey,
        member: &ActorId,
        radius: u64,
    ) -> Result<Vec<RankedEntry>, StoreError> {
        let key = aggregate.as_str();
        let window = with_deadline(
            self.deadline,
            "REV_RANGE_AROUND",
            key,
            self.store.rev_range_around(key, member.as_str(), radius),
        )
        .await?;
        Ok(window
            .map(|w| entries(w.start_rank, w.members))
            .unwrap_or_default())
    }

    pub async fn member_count(&self, aggregate: &AggregateKey) -> Result<u64, StoreError> {
        let key = aggregate.as_str();
        with_deadline(self.deadline, "CARDINALITY", key, self.store.cardinality(key)).await
    }

    /// Removes the whole aggregate. Dedup markers are left to expire.
    pub async fn clear(&self, aggregate: &AggregateKey) -> Result<bool, StoreError> {
        let key = aggregate.as_str();
        with_deadline(self.deadline, "DELETE", key, self.store.delete(key)).await
    }

    pub async fn remaining_retention(&self, aggregate: &AggregateKey) -> Result<KeyTtl, StoreError> {
        let key = aggregate.as_str();
        with_deadline(self.deadline, "TTL", key, self.store.ttl(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, OrderedStore, StoreErrorKind};
    use chrono::NaiveDate;
    use std::sync::Arc;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn board() -> (RankedBoard<MemoryStore>, MemoryStore) {
        let clock = ManualClock::at_date(NaiveDate::from_ymd_opt(2025, 9, 9).unwrap());
        let store = MemoryStore::new(Arc::new(clock));
        (RankedBoard::new(store.clone(), &EngineConfig::new()), store)
    }

    fn agg() -> AggregateKey {
        AggregateKey("lb:distance:all-time".to_string())
    }

    fn actor(id: &str) -> ActorId {
        ActorId::parse(id).unwrap()
    }

    async fn add(board: &RankedBoard<MemoryStore>, member: &str, delta: f64, event: &str) -> IncrementOutcome {
        board
            .increment_once(
                &agg(),
                &DedupKey(format!("lb:dedup:{event}")),
                &actor(member),
                delta,
                WEEK,
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_event_returns_same_total() {
        let (board, _) = board();

        let first = add(&board, "u1", 5.0, "e1").await;
        let second = add(&board, "u1", 5.0, "e1").await;

        assert_eq!(first, IncrementOutcome { total: 5.0, applied: true });
        assert_eq!(second, IncrementOutcome { total: 5.0, applied: false });
    }

    #[tokio::test]
    async fn ties_rank_latest_contributor_first() {
        let (board, _) = board();
        add(&board, "u1", 5.0, "e1").await;
        add(&board, "u2", 9.0, "e2").await;
        add(&board, "u3", 9.0, "e3").await;

        let top = board.top_n(&agg(), 10).await.unwrap();
        let order: Vec<_> = top.iter().map(|e| e.actor_id.as_str()).collect();

        assert_eq!(order, ["u3", "u2", "u1"]);
        assert_eq!(top[0].score, 9.0);
        assert_eq!(top[2].rank, 2);
    }

    #[tokio::test]
    async fn top_n_truncates_and_handles_zero() {
        let (board, _) = board();
        for i in 0..5u32 {
            add(&board, &format!("u{i}"), f64::from(i + 1), &format!("e{i}")).await;
        }

        assert_eq!(board.top_n(&agg(), 3).await.unwrap().len(), 3);
        assert_eq!(board.top_n(&agg(), 100).await.unwrap().len(), 5);
        assert!(board.top_n(&agg(), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_member_has_sentinel_rank() {
        let (board, _) = board();
        add(&board, "u1", 5.0, "e1").await;

        assert_eq!(
            board.rank_and_score(&agg(), &actor("ghost")).await.unwrap(),
            RankScore::ABSENT
        );
        assert_eq!(
            board.rank_and_score(&agg(), &actor("u1")).await.unwrap(),
            RankScore { rank: 0, score: 5.0 }
        );
    }

    #[tokio::test]
    async fn around_uses_absolute_ranks() {
        let (board, _) = board();
        for i in 0..10u32 {
            add(&board, &format!("u{i}"), f64::from(10 - i), &format!("e{i}")).await;
        }

        let window = board.around(&agg(), &actor("u5"), 2).await.unwrap();
        let ranks: Vec<_> = window.iter().map(|e| e.rank).collect();
        let ids: Vec<_> = window.iter().map(|e| e.actor_id.as_str()).collect();

        assert_eq!(ranks, [3, 4, 5, 6, 7]);
        assert_eq!(ids, ["u3", "u4", "u5", "u6", "u7"]);
    }

    #[tokio::test]
    async fn around_absent_member_is_empty() {
        let (board, _) = board();
        add(&board, "u1", 5.0, "e1").await;

        assert!(board.around(&agg(), &actor("ghost"), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_removes_board() {
        let (board, _) = board();
        add(&board, "u1", 5.0, "e1").await;

        assert_eq!(board.member_count(&agg()).await.unwrap(), 1);
        assert!(board.clear(&agg()).await.unwrap());
        assert!(!board.clear(&agg()).await.unwrap());
        assert_eq!(board.member_count(&agg()).await.unwrap(), 0);
        assert_eq!(board.remaining_retention(&agg()).await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn cleared_board_keeps_dedup_markers() {
        let (board, _) = board();
        add(&board, "u1", 5.0, "e1").await;
        board.clear(&agg()).await.unwrap();

        let replay = add(&board, "u1", 5.0, "e1").await;
        assert_eq!(replay, IncrementOutcome { total: 0.0, applied: false });
    }

    #[tokio::test]
    async fn increment_carries_retention_for_new_board() {
        let (board, store) = board();
        let daily = AggregateKey("lb:distance:daily:2025-09-09".to_string());
        let dedup = DedupKey("lb:dedup:daily:e1".to_string());

        board
            .increment_once(&daily, &dedup, &actor("u1"), 1.0, WEEK, Some(5 * WEEK))
            .await
            .unwrap();

        assert_eq!(
            store.ttl(daily.as_str()).await.unwrap(),
            KeyTtl::ExpiresIn(5 * WEEK)
        );
        assert_eq!(board.remaining_retention(&agg()).await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn unavailable_store_fails_closed() {
        let (board, store) = board();
        store.set_unavailable(true);

        let err = board.top_n(&agg(), 10).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Unavailable);
        assert_eq!(err.key, "lb:distance:all-time");
        assert!(!err.is_ambiguous());
    }
}
