#![allow(dead_code)]
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
    Mutex,
};

use payment_queue::{Acknowledger, QueueError};
use thiserror::Error;
use ticket_payment_engine::{
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatus, Payment, PaymentId, PaymentStatus},
    InsertOrderResult,
    InsertPaymentResult,
    PaymentGatewayDatabase,
    SqliteDatabase,
    SqliteDatabaseError,
    TransitionResult,
};

//--------------------------------------     RecordingAcker     -------------------------------------------------------
/// Records how a delivery was settled.
#[derive(Default)]
pub struct RecordingAcker {
    calls: Mutex<Vec<&'static str>>,
    broken: bool,
}

impl RecordingAcker {
    /// An acker whose channel has gone away. Every call fails.
    pub fn broken() -> Self {
        Self { broken: true, ..Default::default() }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), QueueError> {
        self.calls.lock().unwrap().push(call);
        if self.broken {
            return Err(QueueError::AcknowledgementError("channel closed".into()));
        }
        Ok(())
    }
}

impl Acknowledger for RecordingAcker {
    async fn acknowledge(&self) -> Result<(), QueueError> {
        self.record("ack")
    }

    async fn requeue(&self) -> Result<(), QueueError> {
        self.record("requeue")
    }
}

//--------------------------------------        FlakyDb         -------------------------------------------------------
#[derive(Debug, Error)]
pub enum FlakyError {
    #[error("The database is temporarily unavailable")]
    Outage,
    #[error(transparent)]
    Db(#[from] SqliteDatabaseError),
}

/// Wraps a real database, but the next `failures` status transitions fail.
#[derive(Clone)]
pub struct FlakyDb {
    db: SqliteDatabase,
    failures: Arc<AtomicU32>,
}

impl FlakyDb {
    pub fn new(db: SqliteDatabase, failures: u32) -> Self {
        Self { db, failures: Arc::new(AtomicU32::new(failures)) }
    }

    fn trip(&self) -> Result<(), FlakyError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(FlakyError::Outage);
        }
        Ok(())
    }
}

impl PaymentGatewayDatabase for FlakyDb {
    type Error = FlakyError;

    fn url(&self) -> &str {
        self.db.url()
    }

    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, Self::Error> {
        Ok(self.db.fetch_payment(id).await?)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, Self::Error> {
        Ok(self.db.fetch_order(id).await?)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error> {
        Ok(self.db.insert_order(order).await?)
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error> {
        Ok(self.db.insert_payment(payment).await?)
    }

    async fn update_payment_status(&self, id: &PaymentId, status: PaymentStatus) -> Result<(), Self::Error> {
        Ok(self.db.update_payment_status(id, status).await?)
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), Self::Error> {
        Ok(self.db.update_order_status(id, status).await?)
    }

    async fn settle_payment(&self, payment_id: &PaymentId, order_id: &OrderId) -> Result<TransitionResult, Self::Error> {
        self.trip()?;
        Ok(self.db.settle_payment(payment_id, order_id).await?)
    }

    async fn fail_payment(&self, payment_id: &PaymentId) -> Result<TransitionResult, Self::Error> {
        self.trip()?;
        Ok(self.db.fail_payment(payment_id).await?)
    }
}

pub async fn statuses<B: PaymentGatewayDatabase>(db: &B, pid: &str, oid: &str) -> (PaymentStatus, OrderStatus) {
    let payment = db.fetch_payment(&PaymentId::new(pid)).await.unwrap().expect("payment exists");
    let order = db.fetch_order(&OrderId::new(oid)).await.unwrap().expect("order exists");
    (payment.status, order.status)
}
