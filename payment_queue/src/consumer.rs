//! The worker side of the queue.
//!
//! Deliveries are handled one at a time (prefetch is 1) and acknowledged manually. A delivery is only acknowledged
//! once its webhook has been applied; every failure, whether the payload is unreadable, the payment is unknown or the
//! database is unavailable, is negatively acknowledged with requeue so that the broker delivers it again. There is no
//! dead-letter queue and no redelivery cap, so redeliveries are logged to make poison messages visible.
use std::{future::Future, pin::Pin};

use futures::StreamExt;
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions},
    types::FieldTable,
    Consumer,
};
use log::*;
use ticket_payment_engine::{webhook_objects::WebhookMessage, PaymentFlowApi, PaymentGatewayDatabase};

use crate::{
    config::{QueueConfig, CONSUMER_TAG, PREFETCH_COUNT, QUEUE_NAME},
    errors::QueueError,
    supervisor::{ConnectionSupervisor, SupervisorState},
};

/// Settles a delivery with the broker.
#[allow(async_fn_in_trait)]
pub trait Acknowledger {
    /// Removes the delivery from the queue for good.
    async fn acknowledge(&self) -> Result<(), QueueError>;
    /// Hands the delivery back to the broker for redelivery.
    async fn requeue(&self) -> Result<(), QueueError>;
}

impl Acknowledger for Delivery {
    async fn acknowledge(&self) -> Result<(), QueueError> {
        self.ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| QueueError::AcknowledgementError(e.to_string()))
    }

    async fn requeue(&self) -> Result<(), QueueError> {
        self.nack(BasicNackOptions { requeue: true, multiple: false })
            .await
            .map(|_| ())
            .map_err(|e| QueueError::AcknowledgementError(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Acked,
    Requeued,
}

/// Applies a single delivery and settles it. Exactly one of `acknowledge` or `requeue` is called.
///
/// Processing failures are not errors here: they result in [`DeliveryOutcome::Requeued`]. An error is only returned
/// if the delivery could not be settled, which means the channel is no longer usable.
pub async fn handle_delivery<B, A>(
    api: &PaymentFlowApi<B>,
    data: &[u8],
    redelivered: bool,
    acker: &A,
) -> Result<DeliveryOutcome, QueueError>
where
    B: PaymentGatewayDatabase,
    A: Acknowledger,
{
    let message = match WebhookMessage::from_bytes(data) {
        Ok(message) => message,
        Err(e) => {
            warn!("👷️ Could not decode a {} byte delivery. {e}. Requeueing it.", data.len());
            acker.requeue().await?;
            return Ok(DeliveryOutcome::Requeued);
        },
    };
    if redelivered {
        warn!("👷️ Webhook {message} has been delivered before");
    }
    match api.apply_webhook(&message).await {
        Ok(result) => {
            acker.acknowledge().await?;
            debug!("👷️ Webhook {message} acknowledged ({result:?})");
            Ok(DeliveryOutcome::Acked)
        },
        Err(e) => {
            warn!("👷️ Could not apply webhook for payment {}. {e}. Requeueing it.", message.payment_id());
            acker.requeue().await?;
            Ok(DeliveryOutcome::Requeued)
        },
    }
}

/// The worker loop. Owns its own broker connection, separate from any publisher.
pub struct WebhookConsumer<B> {
    api: PaymentFlowApi<B>,
    supervisor: ConnectionSupervisor,
}

impl<B> WebhookConsumer<B>
where B: PaymentGatewayDatabase
{
    pub fn new(config: &QueueConfig, api: PaymentFlowApi<B>) -> Self {
        let supervisor = ConnectionSupervisor::new(config.broker_url.reveal(), "worker")
            .with_prefetch(PREFETCH_COUNT)
            .with_policy(config.reconnect);
        Self { api, supervisor }
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Connects (retrying as per the reconnect policy), declares the queue and registers as a consumer.
    pub async fn start(&mut self) -> Result<Consumer, QueueError> {
        self.supervisor.connect_with_retry().await?;
        let channel = self.supervisor.channel().await?;
        let consumer =
            channel.basic_consume(QUEUE_NAME, CONSUMER_TAG, BasicConsumeOptions::default(), FieldTable::default()).await?;
        info!("👷️ Waiting for webhooks on {QUEUE_NAME}");
        Ok(consumer)
    }

    /// Processes deliveries until `shutdown` resolves, then closes the connection and returns `Ok`.
    ///
    /// If the connection drops, the worker reconnects with a fresh retry budget. An error is returned only when
    /// that budget is exhausted.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), QueueError>
    where F: Future<Output = ()> {
        tokio::pin!(shutdown);
        let mut deliveries = match self.start_or_shutdown(shutdown.as_mut()).await? {
            Some(consumer) => consumer,
            None => return Ok(()),
        };
        loop {
            let next = tokio::select! {
                _ = shutdown.as_mut() => None,
                next = deliveries.next() => Some(next),
            };
            let reconnect = match next {
                None => {
                    info!("👷️ Shutting down");
                    self.supervisor.close().await;
                    return Ok(());
                },
                Some(Some(Ok(delivery))) => {
                    match handle_delivery(&self.api, &delivery.data, delivery.redelivered, &delivery).await {
                        Ok(_) => false,
                        Err(e) => {
                            warn!("👷️ {e}");
                            true
                        },
                    }
                },
                Some(Some(Err(e))) => {
                    warn!("👷️ Lost the connection to the broker. {e}");
                    true
                },
                Some(None) => {
                    warn!("👷️ {}", QueueError::ConsumerClosed);
                    true
                },
            };
            if reconnect {
                self.supervisor.invalidate();
                deliveries = match self.start_or_shutdown(shutdown.as_mut()).await? {
                    Some(consumer) => consumer,
                    None => return Ok(()),
                };
            }
        }
    }

    async fn start_or_shutdown<F>(&mut self, shutdown: Pin<&mut F>) -> Result<Option<Consumer>, QueueError>
    where F: Future<Output = ()> {
        let started = tokio::select! {
            _ = shutdown => None,
            consumer = self.start() => Some(consumer),
        };
        match started {
            Some(consumer) => consumer.map(Some),
            None => {
                info!("👷️ Shutting down");
                self.supervisor.close().await;
                Ok(None)
            },
        }
    }
}
