//! # Ticket payment server
//! This crate hosts the HTTP boundary and the queue worker of the ticket payment pipeline. It is responsible for:
//! * Receiving payment webhooks from the payment provider and checking their signature.
//! * Rejecting webhooks for unknown payments, and acknowledging those for payments that were already processed.
//! * Handing every other webhook to the durable queue (see [`payment_queue`]).
//! * Running the worker that consumes the queue and settles payments and orders.
//!
//! ## Configuration
//! Both binaries are configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/payment`: The signed payment webhook.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod worker;

#[cfg(test)]
mod endpoint_tests;
