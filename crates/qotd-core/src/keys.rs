//! Day-scoped key naming for the ephemeral store.
//!
//! All engine state lives under one prefix so several deployments can
//! share a store without colliding.

use crate::catalog::UserId;
use crate::clock::Day;

/// Builds the store keys for one deployment.
#[derive(Debug, Clone)]
pub struct KeyScheme {
    prefix: String,
}

impl KeyScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Set of candidate quote ids for `day`.
    pub fn pool(&self, day: Day) -> String {
        format!("{}:{day}:quotes", self.prefix)
    }

    /// Write-once marker holding the quote `user` submitted on `day`.
    pub fn submission(&self, day: Day, user: &UserId) -> String {
        format!("{}:{day}:author:{user}", self.prefix)
    }

    /// Set of quote ids already shown to `user` on `day`.
    pub fn seen(&self, day: Day, user: &UserId) -> String {
        format!("{}:{day}:seen:{user}", self.prefix)
    }

    /// Two-member set holding the pair awaiting `user`'s vote on `day`.
    pub fn ballot(&self, day: Day, user: &UserId) -> String {
        format!("{}:{day}:ballot:{user}", self.prefix)
    }

    /// Presence marker for `user`'s in-flight background refill on `day`.
    pub fn refill_flag(&self, day: Day, user: &UserId) -> String {
        format!("{}:{day}:refill:{user}", self.prefix)
    }

    /// Sorted set of per-candidate vote counts for `day`.
    pub fn scores(&self, day: Day) -> String {
        format!("{}:{day}:scores", self.prefix)
    }
}
