use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertOrderResult},
    db_types::{NewOrder, Order, OrderId, OrderStatus},
};

pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let result = match fetch_order(&order.id, conn).await? {
        Some(existing) => InsertOrderResult::AlreadyExists(existing.id),
        None => insert_order(order, conn).await?,
    };
    Ok(result)
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO orders (id, user_id, event_id, quantity, amount_cents)
            VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(&order.event_id)
    .bind(order.quantity)
    .bind(order.amount_cents)
    .execute(conn)
    .await?;
    debug!("🗃️ Order {} for {} has been saved", order.id, order.amount_cents);
    Ok(InsertOrderResult::Inserted(order.id))
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            SELECT id, user_id, event_id, quantity, amount_cents, status, created_at, updated_at
            FROM orders
            WHERE id = $1;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Sets the order status. Returns an error if the order does not exist.
pub(crate) async fn update_order_status(
    id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    trace!("🗃️ Result of update_order_status: {result:?}");
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(id.to_string()));
    }
    Ok(())
}
