//! Identifiers and the quote-lookup collaborator.
//!
//! The engine never stores quote bodies or author profiles — that is the
//! durable repository's job. It only needs two facts about a quote:
//! who wrote it and on which day it was published. [`QuoteCatalog`] is
//! that seam; [`MemoryCatalog`] is the in-process implementation used by
//! tests and embedders without a durable backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clock::Day;

/// Identifier of a quote in the durable repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuoteId(String);

impl QuoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a user, as resolved by the surrounding
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The facts the engine needs about one quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: QuoteId,
    pub author: UserId,
    pub published: Day,
}

/// Read-only lookup into the durable quote repository.
#[async_trait]
pub trait QuoteCatalog: Send + Sync + fmt::Debug {
    /// The author of `quote`, or `None` for an unknown quote.
    async fn author_of(&self, quote: &QuoteId) -> Option<UserId>;

    /// The publication day of `quote`, or `None` for an unknown quote.
    async fn published_on(&self, quote: &QuoteId) -> Option<Day>;
}

/// In-memory quote catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    quotes: RwLock<HashMap<QuoteId, QuoteRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a quote, replacing any record with the same id.
    pub fn add(&self, record: QuoteRecord) {
        self.quotes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.id.clone(), record);
    }
}

#[async_trait]
impl QuoteCatalog for MemoryCatalog {
    async fn author_of(&self, quote: &QuoteId) -> Option<UserId> {
        self.quotes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(quote)
            .map(|record| record.author.clone())
    }

    async fn published_on(&self, quote: &QuoteId) -> Option<Day> {
        self.quotes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(quote)
            .map(|record| record.published)
    }
}
