use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::action::QuoteAction;
use crate::domain::quote::{Quote, QuoteId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored data corrupted: {0}")]
    Corrupted(String),
    /// The quote changed between read and write; the caller may retry
    /// against a fresh snapshot.
    #[error("concurrent modification: {0}")]
    Conflict(String),
}

/// Persistence port for quotes and their append-only action log.
///
/// `insert` and `update` must land the quote row and the accompanying
/// action in one atomic unit; the recorder relies on that to keep
/// `action_count` in lockstep with the log.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn insert(&self, quote: Quote, created: QuoteAction) -> Result<(), StoreError>;

    async fn fetch(&self, id: QuoteId) -> Result<Option<Quote>, StoreError>;

    async fn actions_for(&self, id: QuoteId) -> Result<Vec<QuoteAction>, StoreError>;

    /// Persists the updated quote and, when present, appends one
    /// action. Actions are append-only; nothing here rewrites them.
    ///
    /// The write is conditional on `expected_action_count` still
    /// matching the stored row, so guards that ran against a stale
    /// snapshot fail with [`StoreError::Conflict`] instead of
    /// clobbering a concurrent mutation.
    async fn update(
        &self,
        quote: Quote,
        expected_action_count: u32,
        appended: Option<QuoteAction>,
    ) -> Result<(), StoreError>;

    /// All quotes in insertion order. Prioritization sorts stably on
    /// top of this order.
    async fn list_all(&self) -> Result<Vec<Quote>, StoreError>;
}

/// Map-backed store for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryQuoteStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    order: Vec<QuoteId>,
    quotes: HashMap<QuoteId, Quote>,
    actions: HashMap<QuoteId, Vec<QuoteAction>>,
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn insert(&self, quote: Quote, created: QuoteAction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let id = quote.id;
        if inner.quotes.contains_key(&id) {
            return Err(StoreError::Corrupted(format!("duplicate quote id {id}")));
        }
        inner.order.push(id);
        inner.quotes.insert(id, quote);
        inner.actions.entry(id).or_default().push(created);
        Ok(())
    }

    async fn fetch(&self, id: QuoteId) -> Result<Option<Quote>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.quotes.get(&id).cloned())
    }

    async fn actions_for(&self, id: QuoteId) -> Result<Vec<QuoteAction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.actions.get(&id).cloned().unwrap_or_default())
    }

    async fn update(
        &self,
        quote: Quote,
        expected_action_count: u32,
        appended: Option<QuoteAction>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let id = quote.id;
        match inner.quotes.get(&id) {
            None => return Err(StoreError::Corrupted(format!("update of unknown quote {id}"))),
            Some(current) if current.action_count != expected_action_count => {
                return Err(StoreError::Conflict(format!(
                    "quote {id} changed since it was read"
                )));
            }
            Some(_) => {}
        }
        inner.quotes.insert(id, quote);
        if let Some(action) = appended {
            inner.actions.entry(id).or_default().push(action);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Quote>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.order.iter().filter_map(|id| inner.quotes.get(id).cloned()).collect())
    }
}
