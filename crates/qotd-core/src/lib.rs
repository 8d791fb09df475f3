//! qotd-core: the daily Quote of the Day pairwise-voting engine.
//!
//! Users submit one of their own quotes per day into a shared candidate
//! pool, then compare random pairs of other users' quotes. Each pair is
//! distinct, never repeated for a user, and never contains the user's
//! own quote. When a random draw can't satisfy those constraints the
//! engine keeps looking in a supervised background task instead of
//! blocking the request; votes accumulate into a per-day ranking whose
//! winner becomes queryable once the day has closed.
//!
//! The engine owns no transport and no durable storage: it consumes an
//! injected ephemeral [`qotd_store::StoreHandle`], a [`QuoteCatalog`]
//! for authorship and publication-day lookups, and a [`Clock`] for day
//! scoping.

pub mod ballot;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod pool;
pub mod refill;
pub mod sampler;
pub mod tally;

pub use ballot::{Ballot, BallotOutcome, Vote};
pub use catalog::{MemoryCatalog, QuoteCatalog, QuoteId, QuoteRecord, UserId};
pub use clock::{Clock, Day, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::QotdEngine;
pub use error::{StoreError, SubmitError, VoteError, WinnerError};
pub use refill::RefillSupervisor;
pub use tally::DayWinner;
