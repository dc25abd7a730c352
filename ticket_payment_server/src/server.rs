use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use payment_queue::{QueueMode, WebhookPublisher};
use ticket_payment_engine::{PaymentFlowApi, PaymentGatewayDatabase, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::SignatureMiddlewareFactory,
    routes::{health, PaymentWebhookRoute},
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let publisher = WebhookPublisher::from_config(&config.queue, PaymentFlowApi::new(db.clone()));
    if let WebhookPublisher::Durable(queue) = &publisher {
        // The publisher connects on the first webhook if the broker is not up yet.
        if let Err(e) = queue.connect().await {
            warn!("💻️ Could not connect to the broker at start-up. {e}");
        }
    }
    info!("💻️ Webhooks will be handed over using the {} queue", publisher.mode());
    let srv = create_server_instance(config, db.clone(), publisher.clone())?;
    let result = srv.await.map_err(ServerError::from);
    publisher.close().await;
    if let Err(e) = db.close().await {
        warn!("💻️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    publisher: WebhookPublisher<SqliteDatabase>,
) -> Result<Server, ServerError> {
    if config.queue.mode == QueueMode::Inline {
        warn!("💻️ Webhooks are processed inline. A failed webhook is not retried unless the provider sends it again.");
    }
    let srv = HttpServer::new(move || {
        let payments_api = PaymentFlowApi::new(db.clone());
        let webhook_scope = web::scope("/webhooks")
            .wrap(SignatureMiddlewareFactory::new(config.webhook_secret.clone()))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tpp::access_log"))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(publisher.clone()))
            .service(health)
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
