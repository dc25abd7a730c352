//! Ticket Payment Engine
//!
//! The core of the ticket payment confirmation pipeline. The payment provider reports the outcome of a purchase
//! attempt with a signed webhook; this library contains everything that happens to that webhook that does not involve
//! HTTP or a message broker.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`PaymentGatewayDatabase`]). SQLite is the supported backend. The data types
//!    used in the database are defined in the [`db_types`] module and are public.
//! 2. The payment state machine ([`PaymentFlowApi`]), which applies webhook messages to payments and orders.
//! 3. Webhook plumbing: the [`webhook_objects::WebhookMessage`] wire format and the HMAC signature codec in
//!    [`helpers`].
mod db;

pub mod db_types;
pub mod helpers;
mod tpe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{InsertOrderResult, InsertPaymentResult, PaymentGatewayDatabase, TransitionResult};
pub use tpe_api::{
    errors::PaymentFlowError,
    payment_flow_api::{PaymentFlowApi, WebhookDisposition},
    webhook_objects,
};
