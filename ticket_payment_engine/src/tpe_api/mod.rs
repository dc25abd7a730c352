//! # Ticket payment engine public API
//!
//! * [`payment_flow_api`] is the payment state machine. It applies payment provider webhooks to payments and orders.
//! * [`webhook_objects`] defines the webhook message exchanged between the webhook endpoint and the worker.
//!
//! An API instance is created by supplying a database backend that implements [`crate::PaymentGatewayDatabase`]:
//!
//! ```rust,ignore
//! use ticket_payment_engine::{PaymentFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://ticket_payments.db", 5).await?;
//! let api = PaymentFlowApi::new(db);
//! api.apply_webhook(&message).await?;
//! ```

pub mod errors;
pub mod payment_flow_api;
pub mod webhook_objects;
