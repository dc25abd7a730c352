use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, orders, payments, SqliteDatabaseError};
use crate::{
    db::traits::{InsertOrderResult, InsertPaymentResult, PaymentGatewayDatabase, TransitionResult},
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatus, Payment, PaymentId, PaymentStatus},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(id, &mut conn).await
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order(&payment.order_id, &mut tx).await?.is_none() {
            return Err(SqliteDatabaseError::OrderNotFound(payment.order_id.to_string()));
        }
        let result = payments::idempotent_insert(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn update_payment_status(&self, id: &PaymentId, status: PaymentStatus) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::update_payment_status(id, status, &mut conn).await
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(id, status, &mut conn).await
    }

    /// In a single atomic transaction,
    /// * moves the payment from `Pending` to `Paid`. If the payment is no longer pending, the transaction is rolled
    ///   back and nothing further is done.
    /// * marks the order as `Paid`. If the order does not exist, the whole transaction is rolled back.
    async fn settle_payment(&self, payment_id: &PaymentId, order_id: &OrderId) -> Result<TransitionResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        if !payments::transition_from_pending(payment_id, PaymentStatus::Paid, &mut tx).await? {
            tx.rollback().await?;
            debug!("🗃️ Payment {payment_id} is no longer pending. Settlement skipped.");
            return Ok(TransitionResult::AlreadyProcessed);
        }
        orders::update_order_status(order_id, OrderStatus::Paid, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {payment_id} settled. Order {order_id} is paid.");
        Ok(TransitionResult::Applied)
    }

    async fn fail_payment(&self, payment_id: &PaymentId) -> Result<TransitionResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        if payments::transition_from_pending(payment_id, PaymentStatus::Failed, &mut conn).await? {
            debug!("🗃️ Payment {payment_id} marked as failed");
            Ok(TransitionResult::Applied)
        } else {
            Ok(TransitionResult::AlreadyProcessed)
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `TPP_DATABASE_URL` or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object. The database file is created if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
