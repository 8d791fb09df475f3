//! The store task and its handle.
//!
//! A single tokio task owns the [`Keyspace`]; commands arrive over an
//! mpsc channel and responses go back on a per-request oneshot. The
//! owning task serializes every operation, which is what makes the
//! write-once and increment primitives atomic under concurrent callers.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::StoreError;
use crate::keyspace::{Keyspace, WrongType};

/// A command sent to the store task.
#[derive(Debug)]
pub enum StoreRequest {
    Get { key: String },
    SetNx { key: String, value: Bytes },
    Exists { key: String },
    Del { key: String },
    SAdd { key: String, members: Vec<String> },
    SRem { key: String, members: Vec<String> },
    SMembers { key: String },
    SIsMember { key: String, member: String },
    SCard { key: String },
    SRandMember { key: String, count: usize },
    ZIncrBy { key: String, member: String, delta: i64 },
    ZTop { key: String },
}

/// A reply from the store task.
#[derive(Debug)]
pub enum StoreReply {
    /// A string value (or `None` for a miss).
    Value(Option<Bytes>),
    /// Boolean result (SETNX, DEL, EXISTS, SISMEMBER).
    Bool(bool),
    /// Count result (SADD, SREM, SCARD).
    Count(usize),
    /// Set members (SMEMBERS, SRANDMEMBER).
    Members(Vec<String>),
    /// New score after ZINCRBY.
    Score(i64),
    /// Top-ranked member and its score (ZTOP).
    Top(Option<(String, i64)>),
    /// Operation against a key holding the wrong kind of value.
    WrongType,
}

impl From<WrongType> for StoreReply {
    fn from(_: WrongType) -> Self {
        StoreReply::WrongType
    }
}

struct StoreMessage {
    request: StoreRequest,
    reply: oneshot::Sender<StoreReply>,
}

/// Cheaply-clonable handle to a store task.
///
/// Every method is a single atomic store operation. All methods return
/// [`StoreError::Unavailable`] once the store task has stopped.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreMessage>,
}

/// Spawns a store task and returns the handle for talking to it.
///
/// `buffer` controls the mpsc channel capacity — higher values absorb
/// burst traffic at the cost of memory.
pub fn spawn_store(buffer: usize) -> StoreHandle {
    let (tx, rx) = mpsc::channel(buffer);
    tokio::spawn(run_store(rx));
    StoreHandle { tx }
}

/// The store task's main loop: apply each request to the keyspace and
/// send the reply. Exits when every handle is dropped.
async fn run_store(mut rx: mpsc::Receiver<StoreMessage>) {
    let mut keyspace = Keyspace::new();
    while let Some(msg) = rx.recv().await {
        let reply = apply(&mut keyspace, msg.request);
        // a dropped caller just means nobody is waiting for this reply
        let _ = msg.reply.send(reply);
    }
    debug!("store task exiting, all handles dropped");
}

fn apply(keyspace: &mut Keyspace, request: StoreRequest) -> StoreReply {
    match request {
        StoreRequest::Get { key } => match keyspace.get(&key) {
            Ok(value) => StoreReply::Value(value),
            Err(e) => e.into(),
        },
        StoreRequest::SetNx { key, value } => StoreReply::Bool(keyspace.set_nx(&key, value)),
        StoreRequest::Exists { key } => StoreReply::Bool(keyspace.exists(&key)),
        StoreRequest::Del { key } => StoreReply::Bool(keyspace.del(&key)),
        StoreRequest::SAdd { key, members } => match keyspace.sadd(&key, &members) {
            Ok(n) => StoreReply::Count(n),
            Err(e) => e.into(),
        },
        StoreRequest::SRem { key, members } => match keyspace.srem(&key, &members) {
            Ok(n) => StoreReply::Count(n),
            Err(e) => e.into(),
        },
        StoreRequest::SMembers { key } => match keyspace.smembers(&key) {
            Ok(members) => StoreReply::Members(members),
            Err(e) => e.into(),
        },
        StoreRequest::SIsMember { key, member } => match keyspace.sismember(&key, &member) {
            Ok(found) => StoreReply::Bool(found),
            Err(e) => e.into(),
        },
        StoreRequest::SCard { key } => match keyspace.scard(&key) {
            Ok(n) => StoreReply::Count(n),
            Err(e) => e.into(),
        },
        StoreRequest::SRandMember { key, count } => match keyspace.srandmember(&key, count) {
            Ok(members) => StoreReply::Members(members),
            Err(e) => e.into(),
        },
        StoreRequest::ZIncrBy { key, member, delta } => {
            match keyspace.zincrby(&key, &member, delta) {
                Ok(score) => StoreReply::Score(score),
                Err(e) => e.into(),
            }
        }
        StoreRequest::ZTop { key } => match keyspace.ztop(&key) {
            Ok(top) => StoreReply::Top(top),
            Err(e) => e.into(),
        },
    }
}

impl StoreHandle {
    /// Sends a request and waits for the reply.
    async fn send(&self, request: StoreRequest) -> Result<StoreReply, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let msg = StoreMessage {
            request,
            reply: reply_tx,
        };
        self.tx
            .send(msg)
            .await
            .map_err(|_| StoreError::Unavailable)?;
        reply_rx.await.map_err(|_| StoreError::Unavailable)
    }

    /// Returns the string value at `key`, or `None` if absent.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.send(StoreRequest::Get { key: key.into() }).await? {
            StoreReply::Value(value) => Ok(value),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Writes `key` only if absent. Returns whether the write won.
    pub async fn set_nx(&self, key: &str, value: Bytes) -> Result<bool, StoreError> {
        match self
            .send(StoreRequest::SetNx {
                key: key.into(),
                value,
            })
            .await?
        {
            StoreReply::Bool(won) => Ok(won),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Returns `true` if `key` exists.
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.send(StoreRequest::Exists { key: key.into() }).await? {
            StoreReply::Bool(found) => Ok(found),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Deletes `key`. Returns `true` if it existed.
    pub async fn del(&self, key: &str) -> Result<bool, StoreError> {
        match self.send(StoreRequest::Del { key: key.into() }).await? {
            StoreReply::Bool(existed) => Ok(existed),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Adds members to the set at `key`. Returns the number added.
    pub async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        match self
            .send(StoreRequest::SAdd {
                key: key.into(),
                members: members.to_vec(),
            })
            .await?
        {
            StoreReply::Count(n) => Ok(n),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Removes members from the set at `key`. Returns the number removed.
    pub async fn srem(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        match self
            .send(StoreRequest::SRem {
                key: key.into(),
                members: members.to_vec(),
            })
            .await?
        {
            StoreReply::Count(n) => Ok(n),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Returns all members of the set at `key`.
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.send(StoreRequest::SMembers { key: key.into() }).await? {
            StoreReply::Members(members) => Ok(members),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Checks membership in the set at `key`.
    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        match self
            .send(StoreRequest::SIsMember {
                key: key.into(),
                member: member.into(),
            })
            .await?
        {
            StoreReply::Bool(found) => Ok(found),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Returns the cardinality of the set at `key`.
    pub async fn scard(&self, key: &str) -> Result<usize, StoreError> {
        match self.send(StoreRequest::SCard { key: key.into() }).await? {
            StoreReply::Count(n) => Ok(n),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Draws up to `count` distinct random members of the set at `key`.
    pub async fn srandmember(&self, key: &str, count: usize) -> Result<Vec<String>, StoreError> {
        match self
            .send(StoreRequest::SRandMember {
                key: key.into(),
                count,
            })
            .await?
        {
            StoreReply::Members(members) => Ok(members),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Adds `delta` to `member`'s score in the sorted set at `key`.
    /// Returns the new score.
    pub async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64, StoreError> {
        match self
            .send(StoreRequest::ZIncrBy {
                key: key.into(),
                member: member.into(),
                delta,
            })
            .await?
        {
            StoreReply::Score(score) => Ok(score),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }

    /// Returns the highest-scored member of the sorted set at `key`.
    pub async fn ztop(&self, key: &str) -> Result<Option<(String, i64)>, StoreError> {
        match self.send(StoreRequest::ZTop { key: key.into() }).await? {
            StoreReply::Top(top) => Ok(top),
            StoreReply::WrongType => Err(StoreError::WrongType),
            _ => unreachable!("reply shape matches request"),
        }
    }
}
