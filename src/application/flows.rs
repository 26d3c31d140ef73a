use crate::application::session::{PollSession, StatusPoller};
use crate::domain::order::{OrderId, PaymentMethod};
use crate::domain::ports::{ErrorStoreRef, NavigatorRef, NotifierRef, OutcomeHandler};
use crate::domain::status::PollOutcome;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

pub const VERIFICATION_SENT_MESSAGE: &str = "Verification code sent by sms and on your email";

/// Key under which a failed payment's status label is kept for `link_id`.
pub fn payment_error_key(link_id: &OrderId) -> String {
    format!("payment_error_{link_id}")
}

pub fn order_page(link_id: &OrderId) -> String {
    format!("/orders/{link_id}/")
}

pub fn paid_page(link_id: &OrderId) -> String {
    format!("/orders/{link_id}/paid")
}

/// Reports poll outcomes of the demo checkout to the buyer.
pub struct CheckoutFlow {
    notifier: NotifierRef,
}

impl CheckoutFlow {
    pub fn new(notifier: NotifierRef) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl OutcomeHandler for CheckoutFlow {
    async fn on_outcome(&self, _order_id: &OrderId, outcome: PollOutcome) -> Result<()> {
        match outcome {
            PollOutcome::Paid => self.notifier.notify(VERIFICATION_SENT_MESSAGE).await,
            // Canceled is reported like any other failed transaction here.
            other => {
                let message = format!(
                    "Failed to process transaction. Transaction status: {}",
                    other.status_label()
                );
                self.notifier.notify(&message).await;
            }
        }
        Ok(())
    }
}

/// An order opened through a payment link.
///
/// The transaction status is looked up by `order_id`; pages and stored
/// errors are addressed by `link_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    pub order_id: OrderId,
    pub link_id: OrderId,
    pub payment_method: PaymentMethod,
}

/// Moves the payment-link page along once the payment settles.
pub struct PaymentLinkFlow {
    link_id: OrderId,
    navigator: NavigatorRef,
    errors: ErrorStoreRef,
}

impl PaymentLinkFlow {
    pub fn new(link_id: OrderId, navigator: NavigatorRef, errors: ErrorStoreRef) -> Self {
        Self {
            link_id,
            navigator,
            errors,
        }
    }

    /// Starts polling when the link is paid with mobile money. Cash orders
    /// have nothing to wait for.
    pub fn watch<'a>(
        poller: &'a mut StatusPoller,
        link: &PaymentLink,
    ) -> Option<&'a mut PollSession> {
        if !link.payment_method.is_async() {
            info!(link_id = %link.link_id, "Cash payment, not polling");
            return None;
        }
        Some(poller.start(link.order_id.clone()))
    }

    /// Returns the stored payment error for `link_id` and forgets it.
    pub async fn take_pending_error(
        errors: &ErrorStoreRef,
        link_id: &OrderId,
    ) -> Result<Option<String>> {
        let key = payment_error_key(link_id);
        let error = errors.get(&key).await?;
        if error.is_some() {
            errors.remove(&key).await?;
        }
        Ok(error)
    }
}

#[async_trait]
impl OutcomeHandler for PaymentLinkFlow {
    async fn on_outcome(&self, _order_id: &OrderId, outcome: PollOutcome) -> Result<()> {
        match outcome {
            PollOutcome::Paid => self.navigator.navigate(&paid_page(&self.link_id)).await,
            PollOutcome::Canceled => self.navigator.navigate(&order_page(&self.link_id)).await,
            PollOutcome::Failed(reason) => {
                let stored = self
                    .errors
                    .store(&payment_error_key(&self.link_id), &reason)
                    .await;
                // The buyer leaves the payment page even when the error is lost.
                self.navigator.navigate(&order_page(&self.link_id)).await;
                stored?;
            }
        }
        Ok(())
    }
}
