use crate::application::flows::CheckoutFlow;
use crate::application::session::StatusPoller;
use crate::domain::callback::{SimulatedResponse, WebhookReply};
use crate::domain::order::{
    NewOrder, OrderId, OrderNumber, PaymentMethod, PositionDraft, ShippingAddress,
};
use crate::domain::ports::{CallbackSinkRef, NotifierRef, OrderGatewayRef, StatusSourceRef};
use crate::domain::status::PollOutcome;
use crate::error::{Result, ShopError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ORDER_FAILED_MESSAGE: &str = "Failed to create new order";
pub const CASH_ORDER_MESSAGE: &str = "New order with cash payment created";
pub const AWAITING_PROVIDER_MESSAGE: &str = "Waiting for response from mpesa";

/// What the buyer typed into the demo shop.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutForm {
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Option<String>,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub warehouse: Option<String>,
    pub positions: Vec<PositionDraft>,
}

impl CheckoutForm {
    /// Builds the order payload, keeping only the fully filled positions.
    pub fn into_order(self, order_number: OrderNumber) -> Result<NewOrder> {
        let mut positions = Vec::with_capacity(self.positions.len());
        for draft in self.positions {
            if let Some(position) = draft.complete()? {
                positions.push(position);
            }
        }

        Ok(NewOrder {
            order_number,
            buyer_name: self.buyer_name,
            buyer_phone: self.buyer_phone,
            buyer_email: self.buyer_email.filter(|email| !email.is_empty()),
            shipping_address: ShippingAddress {
                address: self.address,
            },
            payment_method: self.payment_method,
            warehouse: self.warehouse,
            positions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    CashOrder { order_id: OrderId },
    Verified { order_id: OrderId, verification_code: String },
    Declined { order_id: OrderId, description: String },
    /// No provider answer was simulated; the transaction status is being polled.
    AwaitingPayment { order_id: OrderId },
}

/// Demo checkout that creates real orders and fakes the provider's answer.
pub struct CheckoutSimulator {
    orders: OrderGatewayRef,
    webhook: CallbackSinkRef,
    notifier: NotifierRef,
    poller: StatusPoller,
    order_number: OrderNumber,
}

impl CheckoutSimulator {
    pub fn new(
        orders: OrderGatewayRef,
        webhook: CallbackSinkRef,
        status_source: StatusSourceRef,
        notifier: NotifierRef,
    ) -> Self {
        let flow = CheckoutFlow::new(Arc::clone(&notifier));
        Self {
            orders,
            webhook,
            notifier,
            poller: StatusPoller::new(status_source, Arc::new(flow)),
            order_number: OrderNumber::random(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_interval(interval);
        self
    }

    /// Order number the next submission will use.
    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Waits for the payment started by an `Await` submission.
    pub async fn wait_for_payment(&mut self) -> Option<PollOutcome> {
        self.poller.wait().await
    }

    pub async fn submit(
        &mut self,
        form: CheckoutForm,
        response: SimulatedResponse,
    ) -> Result<CheckoutOutcome> {
        self.poller.cancel();

        let order_number = std::mem::replace(&mut self.order_number, OrderNumber::random());
        let order = form.into_order(order_number)?;
        info!(
            order_number = %order.order_number,
            positions = order.positions.len(),
            total = %order.total(),
            "Submitting order"
        );

        let created = match self.orders.create_order(&order).await {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "Order creation failed");
                self.notifier.notify(ORDER_FAILED_MESSAGE).await;
                return Err(e);
            }
        };
        let order_id = created.id;
        info!(order_id = %order_id, "Order successfully created");

        if !order.payment_method.is_async() {
            self.notifier.notify(CASH_ORDER_MESSAGE).await;
            return Ok(CheckoutOutcome::CashOrder { order_id });
        }

        let Some(callback) = response.callback() else {
            self.notifier.notify(AWAITING_PROVIDER_MESSAGE).await;
            self.poller.start(order_id.clone());
            return Ok(CheckoutOutcome::AwaitingPayment { order_id });
        };

        let description = callback.body.stk_callback.result_desc.clone();
        let declined = response != SimulatedResponse::Success;
        let reply = match self.webhook.deliver(&callback).await {
            Ok(reply) => reply,
            // The backend answers declined callbacks with an error status.
            Err(ShopError::Rejected { status, body }) if declined => {
                debug!(status, %body, "Declined callback rejected by webhook");
                WebhookReply::default()
            }
            Err(e) => {
                warn!(error = %e, "Provider callback was not delivered");
                return Err(e);
            }
        };

        if declined {
            if let Some(error) = &reply.error {
                debug!(%error, "Webhook reported an error");
            }
            self.notifier.notify(&description).await;
            return Ok(CheckoutOutcome::Declined {
                order_id,
                description,
            });
        }

        let verification_code = reply.verification_code.ok_or_else(|| {
            ShopError::ValidationError("Webhook reply carried no verification code".to_string())
        })?;
        self.notifier
            .notify(&format!("Verification code is {verification_code}"))
            .await;
        Ok(CheckoutOutcome::Verified {
            order_id,
            verification_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::VERIFICATION_SENT_MESSAGE;
    use crate::domain::callback::ProviderCallback;
    use crate::domain::order::CreatedOrder;
    use crate::domain::ports::{CallbackSink, OrderGateway};
    use crate::domain::status::TransactionStatus;
    use crate::infrastructure::in_memory::{InMemoryNotifier, InMemoryStatusSource};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use tokio::sync::RwLock;

    #[derive(Default, Clone)]
    struct FakeShop {
        orders: Arc<RwLock<Vec<NewOrder>>>,
        callbacks: Arc<RwLock<Vec<ProviderCallback>>>,
        reject_orders: bool,
        webhook_down: bool,
    }

    #[async_trait]
    impl OrderGateway for FakeShop {
        async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder> {
            if self.reject_orders {
                return Err(ShopError::Rejected {
                    status: 400,
                    body: r#"{"buyer_phone": ["This field is required."]}"#.to_string(),
                });
            }
            let mut orders = self.orders.write().await;
            orders.push(order.clone());
            Ok(CreatedOrder {
                id: OrderId::from(100 + orders.len() as u64),
                order_number: Some(order.order_number.to_string()),
                total_amount: Some(order.total()),
            })
        }
    }

    #[async_trait]
    impl CallbackSink for FakeShop {
        async fn deliver(&self, callback: &ProviderCallback) -> Result<WebhookReply> {
            if self.webhook_down {
                return Err(ShopError::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }
            self.callbacks.write().await.push(callback.clone());
            if callback.body.stk_callback.result_code == 0 {
                Ok(WebhookReply {
                    verification_code: Some("4821".to_string()),
                    ..Default::default()
                })
            } else {
                Err(ShopError::Rejected {
                    status: 400,
                    body: "{}".to_string(),
                })
            }
        }
    }

    fn form(method: PaymentMethod) -> CheckoutForm {
        CheckoutForm {
            buyer_name: "Jane".to_string(),
            buyer_phone: "254700000000".to_string(),
            buyer_email: Some(String::new()),
            address: "Moi Avenue 1".to_string(),
            payment_method: method,
            warehouse: None,
            positions: vec![
                PositionDraft {
                    name: Some("Tea".to_string()),
                    price: Some(dec!(2.5)),
                    quantity: Some(dec!(2)),
                    item_id: None,
                },
                // left blank by the buyer
                PositionDraft::default(),
            ],
        }
    }

    fn simulator(
        shop: &FakeShop,
        source: &InMemoryStatusSource,
        notifier: &InMemoryNotifier,
    ) -> CheckoutSimulator {
        CheckoutSimulator::new(
            Arc::new(shop.clone()),
            Arc::new(shop.clone()),
            Arc::new(source.clone()),
            Arc::new(notifier.clone()),
        )
    }

    #[test]
    fn test_form_keeps_filled_positions_only() {
        let order = form(PaymentMethod::Cash)
            .into_order(OrderNumber::new("77"))
            .unwrap();
        assert_eq!(order.positions.len(), 1);
        assert_eq!(order.total(), dec!(5.0));
        assert_eq!(order.buyer_email, None);
        assert_eq!(order.order_number.as_str(), "77");
    }

    #[tokio::test]
    async fn test_cash_order() {
        let shop = FakeShop::default();
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let outcome = sim
            .submit(form(PaymentMethod::Cash), SimulatedResponse::Success)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutOutcome::CashOrder {
                order_id: OrderId::from(101)
            }
        );
        assert_eq!(notifier.messages().await, vec![CASH_ORDER_MESSAGE.to_string()]);
        assert!(shop.callbacks.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_number_changes_after_submit() {
        let shop = FakeShop::default();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &InMemoryNotifier::new());

        let used = sim.order_number().clone();
        sim.submit(form(PaymentMethod::Cash), SimulatedResponse::Success)
            .await
            .unwrap();

        assert_eq!(shop.orders.read().await[0].order_number, used);
    }

    #[tokio::test]
    async fn test_simulated_success_shows_verification_code() {
        let shop = FakeShop::default();
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let outcome = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::Success)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckoutOutcome::Verified {
                order_id: OrderId::from(101),
                verification_code: "4821".to_string()
            }
        );
        assert_eq!(
            notifier.messages().await,
            vec!["Verification code is 4821".to_string()]
        );
        let callbacks = shop.callbacks.read().await;
        assert_eq!(callbacks[0].body.stk_callback.merchant_request_id, "mr_id");
    }

    #[tokio::test]
    async fn test_simulated_decline_shows_description() {
        let shop = FakeShop::default();
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let outcome = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::WrongPin)
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Declined { .. }));
        assert_eq!(
            notifier.messages().await,
            vec!["The initiator information is invalid.".to_string()]
        );
        assert_eq!(shop.callbacks.read().await[0].body.stk_callback.result_code, 10);
    }

    #[tokio::test]
    async fn test_undelivered_decline_is_an_error() {
        let shop = FakeShop {
            webhook_down: true,
            ..Default::default()
        };
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let result = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::WrongPin)
            .await;

        assert!(matches!(result, Err(ShopError::IoError(_))));
        assert!(notifier.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_undelivered_success_is_an_error() {
        let shop = FakeShop {
            webhook_down: true,
            ..Default::default()
        };
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let result = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::Success)
            .await;

        assert!(matches!(result, Err(ShopError::IoError(_))));
        assert!(notifier.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_order_shows_generic_message() {
        let shop = FakeShop {
            reject_orders: true,
            ..Default::default()
        };
        let notifier = InMemoryNotifier::new();
        let mut sim = simulator(&shop, &InMemoryStatusSource::new(), &notifier);

        let result = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::Success)
            .await;

        assert!(matches!(result, Err(ShopError::Rejected { status: 400, .. })));
        assert_eq!(notifier.messages().await, vec![ORDER_FAILED_MESSAGE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_polls_transaction_status() {
        let shop = FakeShop::default();
        let notifier = InMemoryNotifier::new();
        let source = InMemoryStatusSource::new();
        source
            .push_statuses(
                &OrderId::from(101),
                [TransactionStatus::New, TransactionStatus::Success],
            )
            .await;
        let mut sim = simulator(&shop, &source, &notifier);

        let outcome = sim
            .submit(form(PaymentMethod::MobileMoney), SimulatedResponse::Await)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::AwaitingPayment {
                order_id: OrderId::from(101)
            }
        );

        assert_eq!(sim.wait_for_payment().await, Some(PollOutcome::Paid));
        assert_eq!(
            notifier.messages().await,
            vec![
                AWAITING_PROVIDER_MESSAGE.to_string(),
                VERIFICATION_SENT_MESSAGE.to_string()
            ]
        );
        assert!(shop.callbacks.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_submission_cancels_running_poll() {
        let shop = FakeShop::default();
        let notifier = InMemoryNotifier::new();
        let source = InMemoryStatusSource::new();
        source
            .push_statuses(&OrderId::from(101), [TransactionStatus::New])
            .await;
        let mut sim = simulator(&shop, &source, &notifier);

        sim.submit(form(PaymentMethod::MobileMoney), SimulatedResponse::Await)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(source.fetch_count(&OrderId::from(101)).await, 1);

        sim.submit(form(PaymentMethod::Cash), SimulatedResponse::Await)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.fetch_count(&OrderId::from(101)).await, 1);
        assert!(sim.poller().current().is_none());
    }
}
