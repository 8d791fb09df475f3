//! The candidate pool: one validated, write-once submission per user
//! per day, visible to samplers the moment it lands.

use std::sync::Arc;

use bytes::Bytes;
use qotd_store::{StoreError, StoreHandle};
use tracing::info;

use crate::catalog::{QuoteCatalog, QuoteId, UserId};
use crate::clock::Day;
use crate::error::SubmitError;
use crate::keys::KeyScheme;

/// Manages the per-day set of quotes eligible for comparison.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    store: StoreHandle,
    catalog: Arc<dyn QuoteCatalog>,
    keys: Arc<KeyScheme>,
}

impl CandidatePool {
    pub fn new(store: StoreHandle, catalog: Arc<dyn QuoteCatalog>, keys: Arc<KeyScheme>) -> Self {
        Self {
            store,
            catalog,
            keys,
        }
    }

    /// Submits `quote` as `user`'s candidate for `day`.
    ///
    /// The quote must exist, be authored by `user`, and be published on
    /// `day`. The submission marker is claimed with a write-once store
    /// operation, so a concurrent double-submit has exactly one winner
    /// and the stored quote id is never overwritten.
    pub async fn submit(
        &self,
        day: Day,
        user: &UserId,
        quote: &QuoteId,
    ) -> Result<(), SubmitError> {
        let submission_key = self.keys.submission(day, user);
        if self.store.exists(&submission_key).await? {
            return Err(SubmitError::AlreadySubmitted);
        }

        if self.catalog.author_of(quote).await.as_ref() != Some(user) {
            return Err(SubmitError::NotTodaysQuote);
        }
        if self.catalog.published_on(quote).await != Some(day) {
            return Err(SubmitError::NotTodaysQuote);
        }

        if !self
            .store
            .set_nx(&submission_key, Bytes::from(quote.as_str().to_owned()))
            .await?
        {
            return Err(SubmitError::AlreadySubmitted);
        }
        self.store
            .sadd(&self.keys.pool(day), &[quote.as_str().to_owned()])
            .await?;

        info!("quote {quote} submitted by {user} for {day}");
        Ok(())
    }

    /// Current cardinality of the day's pool.
    pub async fn size(&self, day: Day) -> Result<usize, StoreError> {
        self.store.scard(&self.keys.pool(day)).await
    }

    /// Whether `user` has submitted a candidate on `day`.
    pub async fn has_submitted(&self, day: Day, user: &UserId) -> Result<bool, StoreError> {
        self.store.exists(&self.keys.submission(day, user)).await
    }

    /// The quote `user` submitted on `day`, if any.
    pub async fn submission_of(
        &self,
        day: Day,
        user: &UserId,
    ) -> Result<Option<QuoteId>, StoreError> {
        let value = self.store.get(&self.keys.submission(day, user)).await?;
        Ok(value.map(|bytes| QuoteId::new(String::from_utf8_lossy(&bytes).into_owned())))
    }
}
