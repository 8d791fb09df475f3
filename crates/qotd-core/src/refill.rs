//! The background refill: a detached, supervised retry loop that keeps
//! sampling for a user after their synchronous request came up empty.
//!
//! At most one refill runs per (day, user). Cross-process exclusion is
//! the store-level refill flag (claimed by the caller before scheduling,
//! cleared here on every exit path); in-process the supervisor keeps a
//! registry of live tasks so lifecycle is observable and tests can join
//! a refill instead of polling.
//!
//! Termination is bounded by the pool, not an iteration cap: every
//! rejected draw is recorded in the user's seen set, so the unseen pool
//! strictly shrinks until either a valid pair lands or the exhaustion
//! check trips. A day rollover observed mid-loop abandons the run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use qotd_store::{StoreError, StoreHandle};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::UserId;
use crate::clock::{Clock, Day};
use crate::keys::KeyScheme;
use crate::pool::CandidatePool;
use crate::sampler::{PairSampler, Rejection, SampleOutcome};

/// How one refill run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefillEnd {
    /// A valid pair was found and the ballot written.
    Delivered,
    /// The pool holds nothing more this user could be shown.
    Exhausted,
    /// "Today" stopped being the target day mid-loop.
    DayRolledOver,
}

/// The refill worker: everything one run needs, cheap to clone into a task.
#[derive(Debug, Clone)]
pub struct Refiller {
    store: StoreHandle,
    keys: Arc<KeyScheme>,
    sampler: PairSampler,
    pool: CandidatePool,
    clock: Arc<dyn Clock>,
    retry_delay: Duration,
}

impl Refiller {
    pub fn new(
        store: StoreHandle,
        keys: Arc<KeyScheme>,
        sampler: PairSampler,
        pool: CandidatePool,
        clock: Arc<dyn Clock>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            keys,
            sampler,
            pool,
            clock,
            retry_delay,
        }
    }

    /// Runs one refill to completion. The caller must already hold the
    /// refill flag; it is cleared here no matter how the run ends, so a
    /// failed run can never leave the per-user mutex stuck.
    pub(crate) async fn run(&self, day: Day, user: UserId) {
        let end = self.attempt_loop(day, &user).await;

        let flag_key = self.keys.refill_flag(day, &user);
        if let Err(e) = self.store.del(&flag_key).await {
            warn!("refill for {user} on {day} could not clear its flag: {e}");
        }

        match end {
            Ok(RefillEnd::Delivered) => debug!("refill delivered a ballot to {user} for {day}"),
            Ok(RefillEnd::Exhausted) => debug!("pool exhausted for {user} on {day}"),
            Ok(RefillEnd::DayRolledOver) => {
                info!("refill for {user} abandoned: {day} rolled over")
            }
            Err(e) => warn!("refill for {user} on {day} gave up on store error: {e}"),
        }
    }

    pub(crate) async fn attempt_loop(
        &self,
        day: Day,
        user: &UserId,
    ) -> Result<RefillEnd, StoreError> {
        loop {
            if self.clock.today() != day {
                return Ok(RefillEnd::DayRolledOver);
            }

            // Exhaustion check: the user's own submission is unseeable by
            // construction, and a ballot needs two candidates, so the
            // threshold shifts by 2 for submitters and 1 otherwise.
            let pool_size = self.pool.size(day).await?;
            let seen = self.store.scard(&self.keys.seen(day, user)).await?;
            let offset = if self.pool.has_submitted(day, user).await? {
                2
            } else {
                1
            };
            if seen + offset >= pool_size {
                return Ok(RefillEnd::Exhausted);
            }

            match self.sampler.sample(day, user).await? {
                SampleOutcome::Accepted(_) => return Ok(RefillEnd::Delivered),
                SampleOutcome::Rejected {
                    reason: Rejection::PoolTooSmall,
                    ..
                } => return Ok(RefillEnd::Exhausted),
                SampleOutcome::Rejected { drawn, .. } => {
                    // record the draw so the unseen pool strictly shrinks
                    let members: Vec<String> =
                        drawn.iter().map(|q| q.as_str().to_owned()).collect();
                    self.store
                        .sadd(&self.keys.seen(day, user), &members)
                        .await?;
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

/// Registry of live refill tasks, one per (day, user).
#[derive(Debug, Default)]
pub struct RefillSupervisor {
    tasks: DashMap<(Day, UserId), JoinHandle<()>>,
    scheduled: AtomicU64,
}

impl RefillSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a refill for (day, user) unless one is already live.
    ///
    /// The store-level flag is the authoritative cross-process guard;
    /// this registry is the in-process second line plus the lifecycle
    /// record tests and shutdown use. Finished tasks are reaped here.
    pub(crate) fn schedule(&self, refiller: Refiller, day: Day, user: UserId) {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let key = (day, user.clone());
        if self.tasks.contains_key(&key) {
            return;
        }

        self.scheduled.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(async move {
            refiller.run(day, user).await;
        });
        self.tasks.insert(key, handle);
    }

    /// Whether a refill is currently live for (day, user).
    pub fn is_active(&self, day: Day, user: &UserId) -> bool {
        self.tasks
            .get(&(day, user.clone()))
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Number of live refill tasks.
    pub fn active_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Total refills ever scheduled by this supervisor.
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    /// Waits for the (day, user) refill to finish, if one is registered.
    pub async fn wait(&self, day: Day, user: &UserId) {
        if let Some((_, handle)) = self.tasks.remove(&(day, user.clone())) {
            let _ = handle.await;
        }
    }

    /// Aborts every live refill. Store-level flags held by aborted tasks
    /// are not cleared — this is for process shutdown, where the flags
    /// die with the store.
    pub fn abort_all(&self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
        self.tasks.clear();
    }
}
