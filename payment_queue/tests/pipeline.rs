mod support;

use payment_queue::{QueueConfig, QueueMode, WebhookPublisher};
use support::statuses;
use ticket_payment_engine::{
    db_types::{OrderId, OrderStatus, PaymentId, PaymentStatus},
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_pending_payment},
    webhook_objects::{WebhookMessage, WebhookStatus},
    PaymentFlowApi,
    PaymentGatewayDatabase,
};

fn inline_config() -> QueueConfig {
    QueueConfig { mode: QueueMode::Inline, ..Default::default() }
}

#[tokio::test]
async fn paid_webhook_end_to_end() {
    let db = prepare_test_env(&random_db_path()).await;
    seed_pending_payment(&db, "o1", "p1", 5000).await;
    let publisher = WebhookPublisher::from_config(&inline_config(), PaymentFlowApi::new(db.clone()));
    assert_eq!(publisher.mode(), QueueMode::Inline);

    let message = WebhookMessage::new(OrderId::new("o1"), PaymentId::new("p1"), WebhookStatus::Paid);
    publisher.publish(&message).await.unwrap();
    assert_eq!(statuses(&db, "p1", "o1").await, (PaymentStatus::Paid, OrderStatus::Paid));
    let order = db.fetch_order(&OrderId::new("o1")).await.unwrap().unwrap();
    assert_eq!(order.amount_cents.value(), 5000);
}

#[tokio::test]
async fn failed_webhook_end_to_end() {
    let db = prepare_test_env(&random_db_path()).await;
    seed_pending_payment(&db, "o2", "p2", 1200).await;
    let publisher = WebhookPublisher::from_config(&inline_config(), PaymentFlowApi::new(db.clone()));

    let message = WebhookMessage::new(OrderId::new("o2"), PaymentId::new("p2"), WebhookStatus::Failed);
    publisher.publish(&message).await.unwrap();
    assert_eq!(statuses(&db, "p2", "o2").await, (PaymentStatus::Failed, OrderStatus::Pending));
}

#[tokio::test]
async fn inline_errors_reach_the_caller() {
    let db = prepare_test_env(&random_db_path()).await;
    let publisher = WebhookPublisher::from_config(&inline_config(), PaymentFlowApi::new(db));
    let message = WebhookMessage::new(OrderId::new("o1"), PaymentId::new("missing"), WebhookStatus::Paid);
    assert!(publisher.publish(&message).await.is_err());
}
