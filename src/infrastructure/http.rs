use crate::config::Config;
use crate::domain::callback::{ProviderCallback, WebhookReply};
use crate::domain::order::{CreatedOrder, NewOrder, OrderId};
use crate::domain::ports::{CallbackSink, OrderGateway, StatusSource};
use crate::domain::status::{StatusReply, TransactionStatus};
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const ORDERS_PATH: &str = "/api/v1/orders/";
pub const PROVIDER_CALLBACK_PATH: &str = "/mpesa-result/";

/// Client for the shop backend's HTTP API.
///
/// Implements every remote port: transaction status lookups, order creation
/// and delivery of provider callbacks. Cloning shares the underlying
/// connection pool.
#[derive(Clone)]
pub struct ShopApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ShopApiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.api_key.clone(), config.request_timeout())
    }

    pub fn status_url(&self, order_id: &OrderId) -> String {
        format!("{}/transaction/{order_id}/status/", self.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn shop_token(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(|key| format!("ShopToken {key}"))
            .ok_or_else(|| {
                ShopError::ConfigError("An API key is required to create orders".to_string())
            })
    }
}

/// Decodes a JSON body, turning non-2xx answers into `ShopError::Rejected`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ShopError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl StatusSource for ShopApiClient {
    async fn fetch_status(&self, order_id: &OrderId) -> Result<TransactionStatus> {
        let url = self.status_url(order_id);
        debug!(%url, "GET transaction status");
        let response = self.client.get(&url).send().await?;
        let reply: StatusReply = read_json(response).await?;
        Ok(reply.status)
    }
}

#[async_trait]
impl OrderGateway for ShopApiClient {
    async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder> {
        let token = self.shop_token()?;
        let response = self
            .client
            .post(self.url(ORDERS_PATH))
            .header(AUTHORIZATION, token)
            .json(order)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl CallbackSink for ShopApiClient {
    async fn deliver(&self, callback: &ProviderCallback) -> Result<WebhookReply> {
        let response = self
            .client
            .post(self.url(PROVIDER_CALLBACK_PATH))
            .json(callback)
            .send()
            .await?;
        read_json(response).await
    }
}
