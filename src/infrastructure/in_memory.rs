use crate::domain::order::OrderId;
use crate::domain::ports::{ErrorStore, Navigator, Notifier, StatusSource};
use crate::domain::status::TransactionStatus;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment errors.
///
/// Uses `Arc<RwLock<HashMap<String, String>>>` to allow shared concurrent access.
/// Entries live as long as the process; use the RocksDB store when errors
/// must survive a restart.
#[derive(Default, Clone)]
pub struct InMemoryErrorStore {
    errors: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryErrorStore {
    /// Creates a new, empty in-memory error store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ErrorStore for InMemoryErrorStore {
    async fn store(&self, key: &str, error: &str) -> Result<()> {
        let mut errors = self.errors.write().await;
        errors.insert(key.to_string(), error.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let errors = self.errors.read().await;
        Ok(errors.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut errors = self.errors.write().await;
        errors.remove(key);
        Ok(())
    }
}

/// One scripted answer of [`InMemoryStatusSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    Status(TransactionStatus),
    /// The fetch fails as if the backend could not be reached.
    Unreachable,
}

/// A status source that replays scripted answers per order.
///
/// Answers are consumed in order; the last one repeats forever. Every fetch
/// is counted so callers can check how often an order was polled.
#[derive(Default, Clone)]
pub struct InMemoryStatusSource {
    replies: Arc<RwLock<HashMap<OrderId, VecDeque<ScriptedReply>>>>,
    fetches: Arc<RwLock<HashMap<OrderId, usize>>>,
}

impl InMemoryStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, order_id: &OrderId, reply: ScriptedReply) {
        let mut replies = self.replies.write().await;
        replies.entry(order_id.clone()).or_default().push_back(reply);
    }

    pub async fn push_statuses<I>(&self, order_id: &OrderId, statuses: I)
    where
        I: IntoIterator<Item = TransactionStatus>,
    {
        let mut replies = self.replies.write().await;
        replies
            .entry(order_id.clone())
            .or_default()
            .extend(statuses.into_iter().map(ScriptedReply::Status));
    }

    pub async fn fetch_count(&self, order_id: &OrderId) -> usize {
        let fetches = self.fetches.read().await;
        fetches.get(order_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl StatusSource for InMemoryStatusSource {
    async fn fetch_status(&self, order_id: &OrderId) -> Result<TransactionStatus> {
        *self.fetches.write().await.entry(order_id.clone()).or_default() += 1;

        let mut replies = self.replies.write().await;
        let queue = replies.get_mut(order_id).ok_or_else(|| ShopError::Rejected {
            status: 404,
            body: format!("Order {order_id} not found"),
        })?;

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match reply {
            Some(ScriptedReply::Status(status)) => Ok(status),
            Some(ScriptedReply::Unreachable) => Err(ShopError::IoError(std::io::Error::other(
                "status source unreachable",
            ))),
            None => Err(ShopError::Rejected {
                status: 404,
                body: format!("Order {order_id} not found"),
            }),
        }
    }
}

/// Collects notifications instead of showing them.
#[derive(Default, Clone)]
pub struct InMemoryNotifier {
    messages: Arc<RwLock<Vec<String>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, message: &str) {
        self.messages.write().await.push(message.to_string());
    }
}

/// Records navigation targets instead of following them.
#[derive(Default, Clone)]
pub struct InMemoryNavigator {
    visits: Arc<RwLock<Vec<String>>>,
}

impl InMemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn visits(&self) -> Vec<String> {
        self.visits.read().await.clone()
    }
}

#[async_trait]
impl Navigator for InMemoryNavigator {
    async fn navigate(&self, path: &str) {
        self.visits.write().await.push(path.to_string());
    }
}
