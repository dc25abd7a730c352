use log::*;
use payment_queue::{QueueMode, WebhookConsumer};
use ticket_payment_engine::{PaymentFlowApi, PaymentGatewayDatabase, SqliteDatabase};

use crate::{config::WorkerConfig, errors::ServerError};

/// Runs the webhook worker until a shutdown signal arrives.
///
/// Returns `Ok` after a clean shutdown. Any error is fatal: the database could not be opened, or the broker could not
/// be reached within the reconnect budget.
pub async fn run_worker(config: WorkerConfig) -> Result<(), ServerError> {
    if config.queue.mode == QueueMode::Inline {
        return Err(ServerError::ConfigurationError(
            "TPP_QUEUE_TYPE is 'inline'. There is nothing for the worker to consume.".into(),
        ));
    }
    let mut db = SqliteDatabase::new_with_url(&config.database_url, 1)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let mut consumer = WebhookConsumer::new(&config.queue, PaymentFlowApi::new(db.clone()));
    info!("👷️ Webhook worker starting");
    let result = consumer.run_until(shutdown_signal()).await.map_err(ServerError::from);
    if let Err(e) = db.close().await {
        warn!("👷️ Could not close the database cleanly. {e}");
    }
    result
}

/// Resolves on Ctrl-C, or on SIGTERM on unix platforms.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("👷️ Could not listen for Ctrl-C. {e}");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("👷️ Could not listen for SIGTERM. {e}");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => info!("👷️ Received Ctrl-C"),
        _ = terminate => info!("👷️ Received SIGTERM"),
    }
}
