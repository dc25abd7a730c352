use thiserror::Error;

use crate::db_types::{OrderId, PaymentId};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Payment {0} does not exist")]
    PaymentNotFound(PaymentId),
    #[error("Payment {payment_id} belongs to order {expected}, but the webhook refers to order {received}")]
    OrderMismatch { payment_id: PaymentId, expected: OrderId, received: OrderId },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl PaymentFlowError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentFlowError::PaymentNotFound(_))
    }
}
