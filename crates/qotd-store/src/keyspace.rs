//! The keyspace: a flat map of keys to values.
//!
//! Owned by exactly one store task (see [`crate::store`]); there is no
//! internal locking. Keys are never expired — day-scoped callers stop
//! reading old keys instead of relying on TTLs.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use rand::seq::IteratorRandom;

use crate::types::{ScoreSet, Value};

/// Error returned when an operation is used against a key holding the
/// wrong kind of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongType;

impl std::fmt::Display for WrongType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation against a key holding the wrong kind of value")
    }
}

impl std::error::Error for WrongType {}

/// The key-value store backing the voting engine.
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: HashMap<String, Value>,
}

impl Keyspace {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the string value at `key`, or `None` if absent.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, WrongType> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Str(data)) => Ok(Some(data.clone())),
            Some(_) => Err(WrongType),
        }
    }

    /// Sets `key` to `value` only if the key does not exist.
    ///
    /// Returns `true` if the write won the key; `false` leaves any
    /// existing value (of any type) untouched. This is the write-once
    /// primitive behind submission markers and refill flags.
    pub fn set_nx(&mut self, key: &str, value: Bytes) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_owned(), Value::Str(value));
        true
    }

    /// Returns `true` if `key` exists, whatever its type.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Deletes `key`. Returns `true` if it existed.
    pub fn del(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns the number of keys. Used by stats and tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the keyspace holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- set operations --

    /// Adds members to a set, creating it if the key doesn't exist.
    ///
    /// Returns the number of new members added (existing members don't
    /// count).
    pub fn sadd(&mut self, key: &str, members: &[String]) -> Result<usize, WrongType> {
        if members.is_empty() {
            return Ok(0);
        }
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Value::Set(HashSet::new()));
        let Value::Set(set) = entry else {
            return Err(WrongType);
        };
        let mut added = 0;
        for member in members {
            if set.insert(member.clone()) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes members from a set. Returns the number actually removed.
    ///
    /// Deletes the key when the set becomes empty.
    pub fn srem(&mut self, key: &str, members: &[String]) -> Result<usize, WrongType> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(0);
        };
        let Value::Set(set) = entry else {
            return Err(WrongType);
        };
        let mut removed = 0;
        for member in members {
            if set.remove(member) {
                removed += 1;
            }
        }
        if set.is_empty() {
            self.entries.remove(key);
        }
        Ok(removed)
    }

    /// Returns all members of a set (empty for a missing key).
    pub fn smembers(&self, key: &str) -> Result<Vec<String>, WrongType> {
        match self.entries.get(key) {
            None => Ok(vec![]),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(WrongType),
        }
    }

    /// Checks if a member exists in a set.
    pub fn sismember(&self, key: &str, member: &str) -> Result<bool, WrongType> {
        match self.entries.get(key) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(_) => Err(WrongType),
        }
    }

    /// Returns the cardinality of a set (0 for a missing key).
    pub fn scard(&self, key: &str) -> Result<usize, WrongType> {
        match self.entries.get(key) {
            None => Ok(0),
            Some(Value::Set(set)) => Ok(set.len()),
            Some(_) => Err(WrongType),
        }
    }

    /// Draws up to `count` distinct members uniformly at random.
    ///
    /// Returns fewer than `count` members when the set is smaller; never
    /// repeats a member within one draw.
    pub fn srandmember(&self, key: &str, count: usize) -> Result<Vec<String>, WrongType> {
        match self.entries.get(key) {
            None => Ok(vec![]),
            Some(Value::Set(set)) => {
                let mut rng = rand::rng();
                Ok(set.iter().cloned().choose_multiple(&mut rng, count))
            }
            Some(_) => Err(WrongType),
        }
    }

    // -- sorted set operations --

    /// Adds `delta` to `member`'s score in a sorted set, creating the
    /// set and/or member as needed. Returns the new score.
    pub fn zincrby(&mut self, key: &str, member: &str, delta: i64) -> Result<i64, WrongType> {
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Value::Scores(ScoreSet::new()));
        let Value::Scores(scores) = entry else {
            return Err(WrongType);
        };
        Ok(scores.incr(member, delta))
    }

    /// Returns the member with the highest score, or `None` when the
    /// sorted set is missing or empty.
    pub fn ztop(&self, key: &str) -> Result<Option<(String, i64)>, WrongType> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Scores(scores)) => {
                Ok(scores.top().map(|(member, score)| (member.to_owned(), score)))
            }
            Some(_) => Err(WrongType),
        }
    }
}
