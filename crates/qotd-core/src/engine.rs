//! The engine: facade over the voting components.
//!
//! Wires an injected store handle, quote catalog, and clock into the
//! candidate pool, sampler, ballot box, refill supervisor, and tally,
//! and exposes the four public operations the transport layer calls.

use std::sync::Arc;

use qotd_store::{StoreError, StoreHandle};

use crate::ballot::{Ballot, BallotBox, BallotOutcome, Vote};
use crate::catalog::{QuoteCatalog, QuoteId, UserId};
use crate::clock::{Clock, Day};
use crate::config::EngineConfig;
use crate::error::{SubmitError, VoteError, WinnerError};
use crate::keys::KeyScheme;
use crate::pool::CandidatePool;
use crate::refill::{Refiller, RefillSupervisor};
use crate::sampler::PairSampler;
use crate::tally::{DayWinner, ScoreTally};

/// The Quote of the Day voting engine.
///
/// All collaborators are injected at construction; the engine holds no
/// global state and several engines can share one store under different
/// key prefixes.
#[derive(Debug)]
pub struct QotdEngine {
    pool: CandidatePool,
    ballots: BallotBox,
    tally: ScoreTally,
    refills: Arc<RefillSupervisor>,
}

impl QotdEngine {
    pub fn new(
        store: StoreHandle,
        catalog: Arc<dyn QuoteCatalog>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let keys = Arc::new(KeyScheme::new(config.key_prefix));
        let pool = CandidatePool::new(store.clone(), catalog.clone(), keys.clone());
        let sampler = PairSampler::new(store.clone(), catalog, keys.clone());
        let tally = ScoreTally::new(store.clone(), keys.clone(), clock.clone());
        let refills = Arc::new(RefillSupervisor::new());
        let refiller = Refiller::new(
            store.clone(),
            keys.clone(),
            sampler.clone(),
            pool.clone(),
            clock,
            config.refill_retry_delay,
        );
        let ballots = BallotBox::new(store, keys, sampler, tally.clone(), refills.clone(), refiller);

        Self {
            pool,
            ballots,
            tally,
            refills,
        }
    }

    /// Submits `quote` as `user`'s candidate for `day`.
    pub async fn submit(&self, day: Day, user: &UserId, quote: &QuoteId) -> Result<(), SubmitError> {
        self.pool.submit(day, user, quote).await
    }

    /// Requests a pair of candidates for `user` to compare on `day`.
    pub async fn request_ballot(
        &self,
        day: Day,
        user: &UserId,
    ) -> Result<BallotOutcome, StoreError> {
        self.ballots.request(day, user).await
    }

    /// Applies `user`'s vote (or skip) to their outstanding ballot.
    pub async fn cast_vote(&self, day: Day, user: &UserId, vote: Vote) -> Result<(), VoteError> {
        self.ballots.cast(day, user, vote).await
    }

    /// The settled winner of a day strictly before today.
    pub async fn winner_of(&self, day: Day) -> Result<Option<DayWinner>, WinnerError> {
        self.tally.winner_of(day).await
    }

    /// The ballot currently awaiting `user`'s vote, if any.
    pub async fn ballot_of(&self, day: Day, user: &UserId) -> Result<Option<Ballot>, StoreError> {
        self.ballots.outstanding(day, user).await
    }

    /// The quote `user` submitted on `day`, if any.
    pub async fn submission_of(
        &self,
        day: Day,
        user: &UserId,
    ) -> Result<Option<QuoteId>, StoreError> {
        self.pool.submission_of(day, user).await
    }

    /// Current size of the day's candidate pool.
    pub async fn pool_size(&self, day: Day) -> Result<usize, StoreError> {
        self.pool.size(day).await
    }

    /// The refill supervisor, for observing background work.
    pub fn refills(&self) -> &RefillSupervisor {
        &self.refills
    }

    /// Aborts all in-flight background refills.
    pub fn shutdown(&self) {
        self.refills.abort_all();
    }
}
