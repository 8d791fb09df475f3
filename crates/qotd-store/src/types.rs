//! Value types stored in the keyspace.
//!
//! `ScoreSet` is a sorted set of unique string members with integer
//! scores, dual-indexed: a sorted `Vec<(i64, Arc<str>)>` for ordered
//! queries plus a `HashMap<Arc<str>, i64>` for O(1) member→score
//! lookups. Member strings are shared via `Arc<str>` between both
//! structures, so each string is stored once on the heap. Members are
//! ordered by `(score, member)` — ties in score break lexicographically.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;

/// A value held at a key.
#[derive(Debug, Clone)]
pub enum Value {
    /// A plain string value.
    Str(Bytes),
    /// An unordered set of unique string members.
    Set(HashSet<String>),
    /// A sorted set of members ranked by integer score.
    Scores(ScoreSet),
}

impl Value {
    /// The type name reported for introspection and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Set(_) => "set",
            Value::Scores(_) => "zset",
        }
    }
}

/// A sorted set of unique string members with integer scores.
///
/// Rank order is `(score, member)` ascending; the top member is the one
/// with the highest score, ties resolved by the member ordering. That
/// tie-break is deterministic for this structure but callers should not
/// depend on it.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    /// Score-ordered index, kept sorted by `(score, member)` at all times.
    sorted: Vec<(i64, Arc<str>)>,
    /// Member→score index for O(1) lookups.
    scores: HashMap<Arc<str>, i64>,
}

impl ScoreSet {
    /// Creates an empty score set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to a member's score, inserting the member at score
    /// `delta` if absent. Returns the member's new score.
    pub fn incr(&mut self, member: &str, delta: i64) -> i64 {
        if let Some(&old_score) = self.scores.get(member) {
            let new_score = old_score.saturating_add(delta);
            // reuse the existing Arc from the index to avoid a fresh allocation
            let name: Arc<str> = self
                .scores
                .get_key_value(member)
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| Arc::from(member));
            if let Ok(old_idx) = self.search_idx(old_score, &name) {
                self.sorted.remove(old_idx);
            }
            self.scores.insert(name.clone(), new_score);
            if let Err(new_idx) = self.search_idx(new_score, &name) {
                self.sorted.insert(new_idx, (new_score, name));
            }
            new_score
        } else {
            let name: Arc<str> = Arc::from(member);
            self.scores.insert(name.clone(), delta);
            if let Err(idx) = self.search_idx(delta, &name) {
                self.sorted.insert(idx, (delta, name));
            }
            delta
        }
    }

    /// Returns the score for a member, or `None` if not present.
    pub fn score(&self, member: &str) -> Option<i64> {
        self.scores.get(member).copied()
    }

    /// Returns the member with the highest score and its score.
    ///
    /// Among equal top scores, returns this structure's native tie-break
    /// (the lexicographically greatest member).
    pub fn top(&self) -> Option<(&str, i64)> {
        self.sorted.last().map(|(score, member)| (&**member, *score))
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns an iterator over (member, score) pairs in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.sorted.iter().map(|(score, member)| (&**member, *score))
    }

    /// Finds the position of `(score, name)` in the sorted Vec.
    ///
    /// Returns `Ok(idx)` if found, `Err(insertion_point)` if not found.
    /// The sort key is `(score, member)` — same ordering as the set itself.
    fn search_idx(&self, score: i64, name: &Arc<str>) -> Result<usize, usize> {
        self.sorted
            .binary_search_by(|(s, m)| s.cmp(&score).then_with(|| (**m).cmp(&**name)))
    }
}
