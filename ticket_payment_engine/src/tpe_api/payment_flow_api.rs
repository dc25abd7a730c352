use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{PaymentGatewayDatabase, TransitionResult},
    db_types::{Payment, PaymentStatus},
    tpe_api::{
        errors::PaymentFlowError,
        webhook_objects::{WebhookMessage, WebhookStatus},
    },
};

/// What the webhook boundary should do with a verified webhook before handing it to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The payment is still pending. The webhook should be enqueued.
    Enqueue,
    /// The payment has already reached the given terminal status. Nothing needs to be enqueued.
    AlreadyProcessed(PaymentStatus),
}

/// `PaymentFlowApi` drives the payment state machine in response to payment provider webhooks.
///
/// Payments move from `Pending` to exactly one of `Paid` or `Failed`, and never leave a terminal state. A `Paid`
/// webhook settles the payment and its order together; a `Failed` webhook only touches the payment, leaving the order
/// pending so that the customer can try again.
///
/// Webhooks are delivered at least once, so every operation here tolerates seeing the same message more than once.
#[derive(Clone)]
pub struct PaymentFlowApi<B> {
    db: B,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Applies the status carried by `message` to the payment it refers to.
    ///
    /// * If the payment does not exist, [`PaymentFlowError::PaymentNotFound`] is returned and nothing is written.
    /// * If the payment is already in a terminal state, this is a no-op and [`TransitionResult::AlreadyProcessed`] is
    ///   returned. This covers duplicate deliveries as well as contradictory ones (e.g. `FAILED` after `PAID`).
    /// * `PAID` settles the payment and its order atomically. The order id stored against the payment is used, not
    ///   the one in the message.
    /// * `FAILED` marks the payment as failed and leaves the order alone.
    pub async fn apply_webhook(&self, message: &WebhookMessage) -> Result<TransitionResult, PaymentFlowError> {
        let payment = self.payment_for(message).await?;
        if &payment.order_id != message.order_id() {
            warn!(
                "🔄️ Webhook for payment {} names order {}, but the payment belongs to order {}. Using the stored order.",
                payment.id,
                message.order_id(),
                payment.order_id
            );
        }
        let target = PaymentStatus::from(message.status());
        if payment.status.is_terminal() {
            if payment.status == target {
                debug!("🔄️ Payment {} is already {target}. Nothing to do.", payment.id);
            } else {
                warn!(
                    "🔄️ Payment {} is already {}. Ignoring the {target} webhook for order {}.",
                    payment.id, payment.status, payment.order_id
                );
            }
            return Ok(TransitionResult::AlreadyProcessed);
        }
        let result = match message.status() {
            WebhookStatus::Paid => self.db.settle_payment(&payment.id, &payment.order_id).await,
            WebhookStatus::Failed => self.db.fail_payment(&payment.id).await,
        }
        .map_err(|e| PaymentFlowError::DatabaseError(e.to_string()))?;
        match result {
            TransitionResult::Applied => {
                info!("🔄️ Payment {} for order {} is now {target}", payment.id, payment.order_id);
            },
            TransitionResult::AlreadyProcessed => {
                debug!("🔄️ Payment {} was processed concurrently. Nothing to do.", payment.id);
            },
        }
        Ok(result)
    }

    /// The checks the webhook boundary performs before a message is enqueued.
    ///
    /// Returns an error if the payment does not exist or if it belongs to a different order than the webhook claims.
    /// Otherwise reports whether the message still needs processing.
    pub async fn check_webhook(&self, message: &WebhookMessage) -> Result<WebhookDisposition, PaymentFlowError> {
        let payment = self.payment_for(message).await?;
        if &payment.order_id != message.order_id() {
            return Err(PaymentFlowError::OrderMismatch {
                payment_id: payment.id,
                expected: payment.order_id,
                received: message.order_id().clone(),
            });
        }
        if payment.status.is_terminal() {
            trace!("🔄️ Payment {} is already {}", payment.id, payment.status);
            return Ok(WebhookDisposition::AlreadyProcessed(payment.status));
        }
        Ok(WebhookDisposition::Enqueue)
    }

    async fn payment_for(&self, message: &WebhookMessage) -> Result<Payment, PaymentFlowError> {
        self.db
            .fetch_payment(message.payment_id())
            .await
            .map_err(|e| PaymentFlowError::DatabaseError(e.to_string()))?
            .ok_or_else(|| PaymentFlowError::PaymentNotFound(message.payment_id().clone()))
    }
}
