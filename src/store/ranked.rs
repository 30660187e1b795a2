//! The ranked set held under an aggregate key.
//!
//! Members are unique. Order is score descending, then recency sequence
//! descending (the member whose latest increment committed later wins a tie),
//! then member id ascending so that iteration is fully deterministic.
//!
//! The sequence is a store-assigned counter rather than a timestamp folded into
//! the score, so visible scores are exact sums and equal timestamps can never
//! merge.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use super::ScoredMember;

/// A member's current score and the sequence of its latest increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standing {
    pub score: f64,
    pub sequence: u64,
}

#[derive(Debug, Clone)]
struct RankKey {
    score: f64,
    sequence: u64,
    member: String,
}

impl RankKey {
    fn new(member: &str, standing: Standing) -> Self {
        RankKey {
            score: standing.score,
            sequence: standing.sequence,
            member: member.to_owned(),
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| self.member.cmp(&other.member))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

/// Member → score collection iterable in rank order.
#[derive(Debug, Clone, Default)]
pub struct RankedSet {
    standings: HashMap<String, Standing>,
    order: BTreeSet<RankKey>,
}

impl RankedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to `member`, creating it at `delta` if absent, and stamps
    /// it with `sequence`. Returns the new score.
    pub fn increment(&mut self, member: &str, delta: f64, sequence: u64) -> f64 {
        let score = match self.standings.get(member) {
            Some(previous) => {
                self.order.remove(&RankKey::new(member, *previous));
                previous.score + delta
            }
            None => delta,
        };
        let standing = Standing { score, sequence };
        self.standings.insert(member.to_owned(), standing);
        self.order.insert(RankKey::new(member, standing));
        score
    }

    pub fn standing(&self, member: &str) -> Option<Standing> {
        self.standings.get(member).copied()
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.standing(member).map(|s| s.score)
    }

    /// 0-based descending rank of `member`.
    ///
    /// Walks the members ranked above it, so cost grows with the rank.
    pub fn rank(&self, member: &str) -> Option<u64> {
        let standing = self.standing(member)?;
        let above = self.order.range(..RankKey::new(member, standing)).count();
        Some(above as u64)
    }

    /// Members at ranks `start..=stop`, clipped to the set's size.
    pub fn window(&self, start: u64, stop: u64) -> Vec<ScoredMember> {
        let len = self.len();
        if len == 0 || start > stop || start >= len {
            return Vec::new();
        }
        let stop = stop.min(len - 1);
        self.order
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|key| ScoredMember {
                member: key.member.clone(),
                score: key.score,
            })
            .collect()
    }

    pub fn len(&self) -> u64 {
        self.standings.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn members(window: &[ScoredMember]) -> Vec<&str> {
        window.iter().map(|m| m.member.as_str()).collect()
    }

    #[test]
    fn equal_scores_prefer_the_later_increment() {
        let mut set = RankedSet::new();
        set.increment("u1", 5.0, 1);
        set.increment("u2", 9.0, 2);
        set.increment("u3", 9.0, 3);

        assert_eq!(members(&set.window(0, 2)), vec!["u3", "u2", "u1"]);
        assert_eq!(set.rank("u3"), Some(0));
        assert_eq!(set.rank("u2"), Some(1));
        assert_eq!(set.rank("u1"), Some(2));
    }

    #[test]
    fn increment_accumulates_exactly() {
        let mut set = RankedSet::new();
        assert_eq!(set.increment("u1", 5.0, 1), 5.0);
        assert_eq!(set.increment("u1", 2.5, 2), 7.5);
        assert_eq!(set.len(), 1);
        assert_eq!(set.standing("u1"), Some(Standing { score: 7.5, sequence: 2 }));
    }

    #[test]
    fn reincrement_moves_member_ahead_of_tie() {
        let mut set = RankedSet::new();
        set.increment("a", 4.0, 1);
        set.increment("b", 6.0, 2);
        set.increment("a", 2.0, 3);

        // Both at 6.0; "a" was touched last.
        assert_eq!(members(&set.window(0, 1)), vec!["a", "b"]);
    }

    #[test]
    fn window_clips_to_bounds() {
        let mut set = RankedSet::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            set.increment(name, (10 - i) as f64, i as u64);
        }

        assert_eq!(members(&set.window(1, 100)), vec!["b", "c"]);
        assert!(set.window(3, 5).is_empty());
        assert!(set.window(2, 1).is_empty());
        assert!(RankedSet::new().window(0, 0).is_empty());
    }

    #[test]
    fn absent_member_has_no_rank_or_score() {
        let set = RankedSet::new();
        assert_eq!(set.rank("ghost"), None);
        assert_eq!(set.score("ghost"), None);
        assert!(set.is_empty());
    }

    fn arb_increments() -> impl Strategy<Value = Vec<(u8, u16)>> {
        prop::collection::vec((0u8..12, 1u16..50), 1..80)
    }

    proptest! {
        /// Iteration order is strictly descending by (score, sequence) and
        /// every member's rank equals its position in that order.
        #[test]
        fn rank_agrees_with_iteration_order(ops in arb_increments()) {
            let mut set = RankedSet::new();
            for (seq, (member, delta)) in ops.iter().enumerate() {
                set.increment(&format!("m{member}"), f64::from(*delta), seq as u64);
            }

            let all = set.window(0, u64::MAX);
            prop_assert_eq!(all.len() as u64, set.len());

            for pair in all.windows(2) {
                let a = set.standing(&pair[0].member).unwrap();
                let b = set.standing(&pair[1].member).unwrap();
                prop_assert!(
                    a.score > b.score || (a.score == b.score && a.sequence > b.sequence),
                    "{:?} should rank above {:?}", pair[0], pair[1]
                );
            }

            for (position, entry) in all.iter().enumerate() {
                prop_assert_eq!(set.rank(&entry.member), Some(position as u64));
            }
        }

        /// Scores are the exact sum of the deltas applied to each member.
        #[test]
        fn score_is_sum_of_deltas(ops in arb_increments()) {
            let mut set = RankedSet::new();
            let mut expected: HashMap<String, f64> = HashMap::new();
            for (seq, (member, delta)) in ops.iter().enumerate() {
                let name = format!("m{member}");
                set.increment(&name, f64::from(*delta), seq as u64);
                *expected.entry(name).or_default() += f64::from(*delta);
            }
            for (name, total) in expected {
                prop_assert_eq!(set.score(&name), Some(total));
            }
        }
    }
}
