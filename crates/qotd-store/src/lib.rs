//! qotd-store: the ephemeral store behind the voting engine.
//!
//! An in-process key-value/set/sorted-set store owned by a single tokio
//! task. Commands arrive over an mpsc channel and responses go back on a
//! per-request oneshot, so every operation is atomic with respect to all
//! others — callers never read-then-write around the store.

pub mod error;
pub mod keyspace;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use keyspace::{Keyspace, WrongType};
pub use store::{spawn_store, StoreHandle};
pub use types::{ScoreSet, Value};
