use super::callback::{ProviderCallback, WebhookReply};
use super::order::{CreatedOrder, NewOrder, OrderId};
use super::status::{PollOutcome, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Reads the transaction status of an order.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, order_id: &OrderId) -> Result<TransactionStatus>;
}

/// Keeps payment error labels until the order page shows them.
#[async_trait]
pub trait ErrorStore: Send + Sync {
    async fn store(&self, key: &str, error: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Shows a message to the buyer.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Sends the buyer to another page.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, path: &str);
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder>;
}

/// Endpoint that receives mobile-money provider callbacks.
#[async_trait]
pub trait CallbackSink: Send + Sync {
    async fn deliver(&self, callback: &ProviderCallback) -> Result<WebhookReply>;
}

/// Reacts to the end of a poll session.
#[async_trait]
pub trait OutcomeHandler: Send + Sync {
    async fn on_outcome(&self, order_id: &OrderId, outcome: PollOutcome) -> Result<()>;
}

pub type StatusSourceRef = Arc<dyn StatusSource>;
pub type ErrorStoreRef = Arc<dyn ErrorStore>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type NavigatorRef = Arc<dyn Navigator>;
pub type OrderGatewayRef = Arc<dyn OrderGateway>;
pub type CallbackSinkRef = Arc<dyn CallbackSink>;
pub type OutcomeHandlerRef = Arc<dyn OutcomeHandler>;
