//! Payment Queue
//!
//! Moves verified payment webhooks from the webhook endpoint to the worker through a durable AMQP queue
//! (`webhook-payments`), giving at-least-once delivery.
//!
//! * [`WebhookPublisher`] is used by the API server. It either publishes to the broker ([`DurableQueue`]) or, for local
//!   setups without a broker, applies the webhook on the spot ([`InlineProcessor`]). The variant is chosen from
//!   [`QueueConfig`].
//! * [`WebhookConsumer`] is the worker loop. It applies each delivery with the payment engine and acknowledges it, or
//!   requeues it on failure.
//! * [`ConnectionSupervisor`] owns a broker connection and channel on behalf of either side, and reconnects with the
//!   backoff described by a [`ReconnectPolicy`].
pub mod config;
mod consumer;
mod errors;
mod publisher;
mod supervisor;

pub use config::{QueueConfig, QueueMode};
pub use consumer::{handle_delivery, Acknowledger, DeliveryOutcome, WebhookConsumer};
pub use errors::QueueError;
pub use publisher::{DurableQueue, InlineProcessor, WebhookPublisher};
pub use supervisor::{ConnectionSupervisor, ReconnectPolicy, SupervisorState};
