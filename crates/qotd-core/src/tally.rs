//! The score tally: one monotonic counter per candidate per day, and
//! the day-closed winner query.

use std::sync::Arc;

use qotd_store::{StoreError, StoreHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::QuoteId;
use crate::clock::{Clock, Day};
use crate::error::WinnerError;
use crate::keys::KeyScheme;

/// The settled winner of a closed day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWinner {
    pub quote: QuoteId,
    pub votes: i64,
}

/// Accumulates votes and answers winner queries.
#[derive(Debug, Clone)]
pub struct ScoreTally {
    store: StoreHandle,
    keys: Arc<KeyScheme>,
    clock: Arc<dyn Clock>,
}

impl ScoreTally {
    pub fn new(store: StoreHandle, keys: Arc<KeyScheme>, clock: Arc<dyn Clock>) -> Self {
        Self { store, keys, clock }
    }

    /// Counts one vote for `quote` on `day`. Returns the new score.
    pub(crate) async fn record(&self, day: Day, quote: &QuoteId) -> Result<i64, StoreError> {
        let score = self
            .store
            .zincrby(&self.keys.scores(day), quote.as_str(), 1)
            .await?;
        debug!("vote recorded for {quote} on {day}, score now {score}");
        Ok(score)
    }

    /// The top-scored candidate of `day`.
    ///
    /// Fails with [`WinnerError::DayNotClosed`] unless `day` is strictly
    /// before today — in-progress results never leak. Returns `None`
    /// when the day received no votes. Among tied scores the store's
    /// native ordering decides; callers must not depend on tie order.
    pub async fn winner_of(&self, day: Day) -> Result<Option<DayWinner>, WinnerError> {
        if day >= self.clock.today() {
            return Err(WinnerError::DayNotClosed);
        }
        let top = self.store.ztop(&self.keys.scores(day)).await?;
        Ok(top.map(|(member, votes)| DayWinner {
            quote: QuoteId::new(member),
            votes,
        }))
    }
}
