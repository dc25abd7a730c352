use actix_web::http::StatusCode;
use ticket_payment_engine::{
    db_types::{OrderId, OrderStatus, PaymentId, PaymentStatus},
    webhook_objects::{WebhookMessage, WebhookStatus},
    PaymentGatewayDatabase,
    SqliteDatabase,
};

use super::helpers::*;

fn webhook(order_id: &str, payment_id: &str, status: WebhookStatus) -> Vec<u8> {
    WebhookMessage::new(OrderId::new(order_id), PaymentId::new(payment_id), status).to_bytes().unwrap()
}

async fn statuses(db: &SqliteDatabase) -> (PaymentStatus, OrderStatus) {
    let payment = db.fetch_payment(&PaymentId::new("pay-1")).await.unwrap().expect("payment exists");
    let order = db.fetch_order(&OrderId::new("order-1")).await.unwrap().expect("order exists");
    (payment.status, order.status)
}

#[actix_web::test]
async fn signed_paid_webhook_settles_the_order() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, response) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert!(response.contains(r#""success":true"#));
    assert_eq!(statuses(&db).await, (PaymentStatus::Paid, OrderStatus::Paid));
}

#[actix_web::test]
async fn signed_failed_webhook_leaves_the_order_pending() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Failed);
    let sig = sign(&body);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(statuses(&db).await, (PaymentStatus::Failed, OrderStatus::Pending));
}

#[actix_web::test]
async fn missing_signature_is_unauthorized() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(statuses(&db).await, (PaymentStatus::Pending, OrderStatus::Pending));
}

#[actix_web::test]
async fn wrong_signature_is_unauthorized() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let other = webhook("order-1", "pay-1", WebhookStatus::Failed);
    let sig = sign(&other);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some("not hex")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(statuses(&db).await, (PaymentStatus::Pending, OrderStatus::Pending));
}

#[actix_web::test]
async fn missing_secret_is_a_server_error() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, _) = post_webhook(&db, inline_publisher(&db), "", &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(statuses(&db).await, (PaymentStatus::Pending, OrderStatus::Pending));
}

#[actix_web::test]
async fn unreadable_body_is_a_bad_request() {
    let db = seeded_db().await;
    let bodies: [&[u8]; 3] = [
        b"not json",
        br#"{"orderId": "order-1", "paymentId": "pay-1", "status": "PENDING"}"#,
        br#"{"orderId": "", "paymentId": "pay-1", "status": "PAID"}"#,
    ];
    for body in bodies {
        let sig = sign(body);
        let (status, response) = post_webhook(&db, inline_publisher(&db), SECRET, body, Some(&sig)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{response}");
    }
}

#[actix_web::test]
async fn unknown_payment_is_not_found() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-404", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, response) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(response.contains(r#""success":false"#));
}

#[actix_web::test]
async fn order_mismatch_is_a_bad_request() {
    let db = seeded_db().await;
    let body = webhook("order-2", "pay-1", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(statuses(&db).await, (PaymentStatus::Pending, OrderStatus::Pending));
}

#[actix_web::test]
async fn processed_payments_are_acknowledged_without_publishing() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, _) = post_webhook(&db, inline_publisher(&db), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
    // The broker is unreachable, so anything that tried to publish would fail with a 500.
    let (status, response) = post_webhook(&db, unreachable_publisher(), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert!(response.contains("already processed"));
    assert_eq!(statuses(&db).await, (PaymentStatus::Paid, OrderStatus::Paid));
}

#[actix_web::test]
async fn publish_failure_is_a_server_error() {
    let db = seeded_db().await;
    let body = webhook("order-1", "pay-1", WebhookStatus::Paid);
    let sig = sign(&body);
    let (status, _) = post_webhook(&db, unreachable_publisher(), SECRET, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(statuses(&db).await, (PaymentStatus::Pending, OrderStatus::Pending));
}
