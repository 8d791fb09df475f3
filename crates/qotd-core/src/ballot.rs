//! The per-user, per-day ballot state machine.
//!
//! A user is either awaiting a vote on an outstanding pair, idle, or
//! idle with a background refill in flight. `request` walks those
//! states: re-deliver an outstanding ballot, defer to an in-flight
//! refill, or sample — and on a retryable rejection, claim the refill
//! flag and hand off to the supervisor.

use std::sync::Arc;

use bytes::Bytes;
use qotd_store::{StoreError, StoreHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{QuoteId, UserId};
use crate::clock::Day;
use crate::error::VoteError;
use crate::keys::KeyScheme;
use crate::refill::{Refiller, RefillSupervisor};
use crate::sampler::{PairSampler, Rejection, SampleOutcome};
use crate::tally::ScoreTally;

/// A pair of candidates offered for comparison.
///
/// The pair is persisted as a 2-member set, so order carries no meaning;
/// the constructor normalizes so equal ballots compare equal however
/// they were read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub first: QuoteId,
    pub second: QuoteId,
}

impl Ballot {
    /// Builds a ballot from two distinct candidates.
    pub fn new(a: QuoteId, b: QuoteId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Rebuilds a ballot from stored set members; `None` unless exactly
    /// two members are present.
    pub fn from_members(mut members: Vec<String>) -> Option<Self> {
        if members.len() != 2 {
            return None;
        }
        let second = QuoteId::new(members.pop()?);
        let first = QuoteId::new(members.pop()?);
        Some(Self::new(first, second))
    }

    /// Whether `quote` is one of the two offered candidates.
    pub fn contains(&self, quote: &QuoteId) -> bool {
        self.first == *quote || self.second == *quote
    }
}

/// What a ballot request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallotOutcome {
    /// A pair awaiting this user's vote.
    Pair(Ballot),
    /// Nothing to offer right now — check back later.
    Empty,
}

/// A user's decision on their outstanding ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    /// Abandon the pairing without scoring either candidate.
    Skip,
    /// Prefer this candidate.
    For(QuoteId),
}

/// Serves ballot requests and applies votes.
#[derive(Debug)]
pub struct BallotBox {
    store: StoreHandle,
    keys: Arc<KeyScheme>,
    sampler: PairSampler,
    tally: ScoreTally,
    refills: Arc<RefillSupervisor>,
    refiller: Refiller,
}

impl BallotBox {
    pub fn new(
        store: StoreHandle,
        keys: Arc<KeyScheme>,
        sampler: PairSampler,
        tally: ScoreTally,
        refills: Arc<RefillSupervisor>,
        refiller: Refiller,
    ) -> Self {
        Self {
            store,
            keys,
            sampler,
            tally,
            refills,
            refiller,
        }
    }

    /// Requests a ballot for `user` on `day`.
    ///
    /// Idempotent while a ballot is outstanding, and a no-op while a
    /// background refill holds the flag. A `PoolTooSmall` rejection is
    /// final for now (nothing to find, no refill); seen/authorship
    /// rejections schedule the background refill and report `Empty`.
    pub async fn request(&self, day: Day, user: &UserId) -> Result<BallotOutcome, StoreError> {
        let ballot_key = self.keys.ballot(day, user);
        if let Some(ballot) = Ballot::from_members(self.store.smembers(&ballot_key).await?) {
            debug!("re-delivering outstanding ballot to {user} for {day}");
            return Ok(BallotOutcome::Pair(ballot));
        }

        if self.store.exists(&self.keys.refill_flag(day, user)).await? {
            return Ok(BallotOutcome::Empty);
        }

        match self.sampler.sample(day, user).await? {
            SampleOutcome::Accepted(ballot) => Ok(BallotOutcome::Pair(ballot)),
            SampleOutcome::Rejected {
                reason: Rejection::PoolTooSmall,
                ..
            } => Ok(BallotOutcome::Empty),
            SampleOutcome::Rejected { reason, .. } => {
                // claim the flag atomically; the loser of a concurrent
                // race must not start a second refill
                let claimed = self
                    .store
                    .set_nx(&self.keys.refill_flag(day, user), Bytes::from_static(b"1"))
                    .await?;
                if claimed {
                    debug!("scheduling refill for {user} on {day} after {reason:?} rejection");
                    self.refills
                        .schedule(self.refiller.clone(), day, user.clone());
                }
                Ok(BallotOutcome::Empty)
            }
        }
    }

    /// The outstanding ballot for `user` on `day`, if any.
    pub async fn outstanding(&self, day: Day, user: &UserId) -> Result<Option<Ballot>, StoreError> {
        let members = self.store.smembers(&self.keys.ballot(day, user)).await?;
        Ok(Ballot::from_members(members))
    }

    /// Applies `vote` to the user's outstanding ballot.
    ///
    /// `Skip` always succeeds and clears any ballot without scoring.
    /// A vote for a candidate requires an outstanding ballot containing
    /// that candidate; on success the score is incremented and the
    /// ballot cleared.
    pub async fn cast(&self, day: Day, user: &UserId, vote: Vote) -> Result<(), VoteError> {
        let ballot_key = self.keys.ballot(day, user);
        match vote {
            Vote::Skip => {
                self.store.del(&ballot_key).await.map_err(VoteError::from)?;
                debug!("{user} skipped their ballot for {day}");
                Ok(())
            }
            Vote::For(choice) => {
                if !self.store.exists(&ballot_key).await? {
                    return Err(VoteError::NoActiveBallot);
                }
                if !self.store.sismember(&ballot_key, choice.as_str()).await? {
                    return Err(VoteError::InvalidChoice);
                }
                self.tally.record(day, &choice).await?;
                self.store.del(&ballot_key).await?;
                debug!("{user} voted for {choice} on {day}");
                Ok(())
            }
        }
    }
}
