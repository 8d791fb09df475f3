//! The pair sampler: draw two candidates, apply the acceptance
//! constraints, and either write the ballot or report why not.
//!
//! A rejection never mutates seen or ballot state — the caller decides
//! whether to retry synchronously or hand off to the background refill.

use std::sync::Arc;

use qotd_store::{StoreError, StoreHandle};
use tracing::debug;

use crate::ballot::Ballot;
use crate::catalog::{QuoteCatalog, QuoteId, UserId};
use crate::clock::Day;
use crate::keys::KeyScheme;

/// Why a draw was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The pool has fewer than two candidates; nothing to compare.
    PoolTooSmall,
    /// A drawn candidate was already shown to this user today.
    SeenBefore,
    /// A drawn candidate is the user's own quote (or unknown to the
    /// catalog, which is treated the same way).
    OwnQuote,
}

/// Result of one sampling attempt.
#[derive(Debug, Clone)]
pub enum SampleOutcome {
    /// Both constraints passed; the ballot has been written and the
    /// candidates recorded as seen.
    Accepted(Ballot),
    /// The draw failed a constraint. `drawn` carries the candidates so
    /// the refill loop can do its own bookkeeping; the shared state is
    /// untouched.
    Rejected {
        reason: Rejection,
        drawn: Vec<QuoteId>,
    },
}

/// Draws candidate pairs for one engine.
#[derive(Debug, Clone)]
pub struct PairSampler {
    store: StoreHandle,
    catalog: Arc<dyn QuoteCatalog>,
    keys: Arc<KeyScheme>,
}

impl PairSampler {
    pub fn new(store: StoreHandle, catalog: Arc<dyn QuoteCatalog>, keys: Arc<KeyScheme>) -> Self {
        Self {
            store,
            catalog,
            keys,
        }
    }

    /// Attempts to produce a ballot for `user` on `day`.
    ///
    /// Draws two distinct members uniformly at random from the day's
    /// pool, then rejects the whole draw if either candidate has been
    /// seen by this user or was authored by them. On acceptance both
    /// candidates are recorded as seen *before* the ballot is written,
    /// so a candidate can never be re-offered.
    pub async fn sample(&self, day: Day, user: &UserId) -> Result<SampleOutcome, StoreError> {
        let drawn = self.store.srandmember(&self.keys.pool(day), 2).await?;
        if drawn.len() < 2 {
            return Ok(SampleOutcome::Rejected {
                reason: Rejection::PoolTooSmall,
                drawn: drawn.into_iter().map(QuoteId::new).collect(),
            });
        }
        let first = QuoteId::new(drawn[0].clone());
        let second = QuoteId::new(drawn[1].clone());

        let seen_key = self.keys.seen(day, user);
        if self.store.sismember(&seen_key, first.as_str()).await?
            || self.store.sismember(&seen_key, second.as_str()).await?
        {
            debug!("draw rejected for {user} on {day}: candidate already seen");
            return Ok(SampleOutcome::Rejected {
                reason: Rejection::SeenBefore,
                drawn: vec![first, second],
            });
        }

        if self.authored_or_unknown(user, &first).await
            || self.authored_or_unknown(user, &second).await
        {
            debug!("draw rejected for {user} on {day}: own or unknown quote");
            return Ok(SampleOutcome::Rejected {
                reason: Rejection::OwnQuote,
                drawn: vec![first, second],
            });
        }

        let members = [first.as_str().to_owned(), second.as_str().to_owned()];
        self.store.sadd(&seen_key, &members).await?;
        self.store
            .sadd(&self.keys.ballot(day, user), &members)
            .await?;

        debug!("ballot {first} vs {second} issued to {user} for {day}");
        Ok(SampleOutcome::Accepted(Ballot::new(first, second)))
    }

    async fn authored_or_unknown(&self, user: &UserId, quote: &QuoteId) -> bool {
        match self.catalog.author_of(quote).await {
            Some(author) => author == *user,
            None => true,
        }
    }
}
