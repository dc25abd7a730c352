use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tpp_common::Cents;

use crate::{
    db_types::{NewOrder, NewPayment, OrderId, PaymentId},
    PaymentGatewayDatabase,
    SqliteDatabase,
};

/// Creates a fresh database at `url`, runs the migrations and returns a connection to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("tpp_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Inserts a pending order and a pending payment for it.
pub async fn seed_pending_payment(db: &SqliteDatabase, order_id: &str, payment_id: &str, amount_cents: i64) {
    let order =
        NewOrder::new(OrderId::new(order_id), "user-1".into(), "event-1".into(), 2, Cents::from(amount_cents));
    db.insert_order(order).await.expect("Error inserting order");
    let payment = NewPayment::new(PaymentId::new(payment_id), OrderId::new(order_id), "FAKEPAY")
        .with_payload(serde_json::json!({"card": "**** 4242"}));
    db.insert_payment(payment).await.expect("Error inserting payment");
}
