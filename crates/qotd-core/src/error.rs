//! Error types for the engine's public operations.
//!
//! Client/state errors surface to the caller verbatim and are never
//! retried internally. Store faults nest via `#[from]` so every
//! operation's signature tells the transport layer exactly what can go
//! wrong.

use thiserror::Error;

pub use qotd_store::StoreError;

/// Errors from submitting a candidate quote.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The user already submitted a quote today.
    #[error("a quote was already submitted today")]
    AlreadySubmitted,
    /// The quote is unknown, not the submitter's own, or not published
    /// on the submission day.
    #[error("only your own quote written today can be submitted")]
    NotTodaysQuote,
    /// The ephemeral store is unreachable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from casting a vote.
#[derive(Debug, Error)]
pub enum VoteError {
    /// There is no ballot awaiting this user's vote.
    #[error("no ballot is awaiting a vote")]
    NoActiveBallot,
    /// The choice is not one of the two offered quotes.
    #[error("choice is not on the ballot")]
    InvalidChoice,
    /// The ephemeral store is unreachable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from querying a day's winner.
#[derive(Debug, Error)]
pub enum WinnerError {
    /// The day is still open (today or later); results would leak
    /// in-progress scores.
    #[error("the day has not closed yet")]
    DayNotClosed,
    /// The ephemeral store is unreachable.
    #[error(transparent)]
    Store(#[from] StoreError),
}
