use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Could not serialize payment payload: {0}")]
    PayloadError(#[from] serde_json::Error),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(String),
}
