//! # Persistence contracts
//!
//! The payment pipeline never talks to a database directly. Backends implement [`PaymentGatewayDatabase`], and the
//! [`crate::PaymentFlowApi`] drives them.
mod data_objects;
mod payment_gateway_database;

pub use data_objects::{InsertOrderResult, InsertPaymentResult, TransitionResult};
pub use payment_gateway_database::PaymentGatewayDatabase;
