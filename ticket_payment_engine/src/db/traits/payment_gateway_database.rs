use crate::{
    db::traits::{InsertOrderResult, InsertPaymentResult, TransitionResult},
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatus, Payment, PaymentId, PaymentStatus},
};

/// This trait defines the persistence behaviour the payment confirmation pipeline relies on.
///
/// This behaviour includes:
/// * Looking up payments and orders
/// * Recording new orders and purchase attempts
/// * Single-row status updates
/// * The guarded, atomic status transitions driven by payment webhooks
///
/// Every method must be durable once it returns `Ok`.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    type Error: std::error::Error;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the payment with the given id, if it exists.
    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, Self::Error>;

    /// Fetches the order with the given id, if it exists.
    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, Self::Error>;

    /// Stores a new order. If an order with the same id already exists, nothing is changed.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error>;

    /// Stores a new purchase attempt. If a payment with the same id already exists, nothing is changed.
    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error>;

    /// Unconditionally sets the status of a payment.
    async fn update_payment_status(&self, id: &PaymentId, status: PaymentStatus) -> Result<(), Self::Error>;

    /// Unconditionally sets the status of an order.
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), Self::Error>;

    /// Marks a payment and its order as paid in a single atomic transaction.
    ///
    /// The payment row is written first, and only if it is still `Pending`. If it is not, nothing is written and
    /// [`TransitionResult::AlreadyProcessed`] is returned. Readers never observe a `Paid` payment with a `Pending`
    /// order.
    async fn settle_payment(&self, payment_id: &PaymentId, order_id: &OrderId) -> Result<TransitionResult, Self::Error>;

    /// Marks a payment as failed, but only if it is still `Pending`. The order is left untouched.
    async fn fail_payment(&self, payment_id: &PaymentId) -> Result<TransitionResult, Self::Error>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
