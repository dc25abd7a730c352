use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertPaymentResult},
    db_types::{NewPayment, Payment, PaymentId, PaymentStatus},
};

pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, SqliteDatabaseError> {
    let result = match fetch_payment(&payment.id, conn).await? {
        Some(existing) => InsertPaymentResult::AlreadyExists(existing.id),
        None => insert_payment(payment, conn).await?,
    };
    Ok(result)
}

async fn insert_payment(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, SqliteDatabaseError> {
    let payload = serde_json::to_string(&payment.payload)?;
    sqlx::query(
        r#"
            INSERT INTO payments (id, order_id, provider, status, payload)
            VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(&payment.provider)
    .bind(payment.status)
    .bind(payload)
    .execute(conn)
    .await?;
    debug!("🗃️ {} payment {} for order {} has been saved", payment.provider, payment.id, payment.order_id);
    Ok(InsertPaymentResult::Inserted(payment.id))
}

pub async fn fetch_payment(
    id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqliteDatabaseError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
            SELECT id, order_id, provider, status, payload, created_at, updated_at
            FROM payments
            WHERE id = $1;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Sets the payment status unconditionally. Returns an error if the payment does not exist.
pub(crate) async fn update_payment_status(
    id: &PaymentId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    trace!("🗃️ Result of update_payment_status: {result:?}");
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::PaymentNotFound(id.to_string()));
    }
    Ok(())
}

/// Moves a payment out of `Pending`. Returns `false` (and changes nothing) if the payment is not currently pending.
pub(crate) async fn transition_from_pending(
    id: &PaymentId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = 'PENDING'",
    )
    .bind(status)
    .bind(id)
    .execute(conn)
    .await?;
    trace!("🗃️ Result of transition_from_pending: {result:?}");
    Ok(result.rows_affected() == 1)
}
