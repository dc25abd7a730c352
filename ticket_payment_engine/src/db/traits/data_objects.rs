use crate::db_types::{OrderId, PaymentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(OrderId),
    AlreadyExists(OrderId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPaymentResult {
    Inserted(PaymentId),
    AlreadyExists(PaymentId),
}

/// Result of a guarded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// The payment was `Pending` and the new status (and, for settlements, the order status) has been written.
    Applied,
    /// The payment had already left the `Pending` state. Nothing was written.
    AlreadyProcessed,
}
