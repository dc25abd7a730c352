use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderId, PaymentId, PaymentStatus};

/// The outcome reported by the payment provider. A webhook never carries `PENDING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookStatus {
    Paid,
    Failed,
}

impl From<WebhookStatus> for PaymentStatus {
    fn from(value: WebhookStatus) -> Self {
        match value {
            WebhookStatus::Paid => PaymentStatus::Paid,
            WebhookStatus::Failed => PaymentStatus::Failed,
        }
    }
}

impl Display for WebhookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PaymentStatus::from(*self).fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum WebhookMessageError {
    #[error("Webhook payload is not valid JSON for a payment webhook. {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Webhook payload is missing a value for {0}")]
    EmptyField(&'static str),
}

/// A payment status notification, exactly as it travels on the queue:
///
/// ```json
/// {"orderId": "o1", "paymentId": "p1", "status": "PAID"}
/// ```
///
/// Messages are immutable once created. Consumers treat the queued bytes as the single source of truth for the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
    order_id: OrderId,
    payment_id: PaymentId,
    status: WebhookStatus,
}

impl WebhookMessage {
    pub fn new(order_id: OrderId, payment_id: PaymentId, status: WebhookStatus) -> Self {
        Self { order_id, payment_id, status }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn payment_id(&self) -> &PaymentId {
        &self.payment_id
    }

    pub fn status(&self) -> WebhookStatus {
        self.status
    }

    /// UTF-8 JSON encoding of the message. This is the exact byte sequence that is enqueued.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WebhookMessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes and validates a message. Unknown fields are ignored, but both ids must be non-empty.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WebhookMessageError> {
        let message: Self = serde_json::from_slice(data)?;
        if message.order_id.as_str().is_empty() {
            return Err(WebhookMessageError::EmptyField("orderId"));
        }
        if message.payment_id.as_str().is_empty() {
            return Err(WebhookMessageError::EmptyField("paymentId"));
        }
        Ok(message)
    }
}

impl Display for WebhookMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] order {} -> {}", self.payment_id, self.order_id, self.status)
    }
}
