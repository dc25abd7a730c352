use std::sync::Arc;

use lapin::{options::BasicPublishOptions, BasicProperties};
use log::*;
use ticket_payment_engine::{webhook_objects::WebhookMessage, PaymentFlowApi, PaymentGatewayDatabase};
use tokio::sync::Mutex;

use crate::{
    config::{QueueConfig, QueueMode, BROKER_TIMEOUT, QUEUE_NAME},
    errors::QueueError,
    supervisor::{ConnectionSupervisor, ReconnectPolicy, SupervisorState},
};

const PERSISTENT: u8 = 2;

//--------------------------------------     DurableQueue     ---------------------------------------------------------
/// Publishes webhooks to the durable broker queue.
///
/// Clones share a single connection and channel, and publishes are serialized through it. Failed publishes (including
/// broker NACKs) are retried on a fresh connection, up to the attempt budget of the retry policy.
#[derive(Clone)]
pub struct DurableQueue {
    supervisor: Arc<Mutex<ConnectionSupervisor>>,
    policy: ReconnectPolicy,
}

impl DurableQueue {
    pub fn new(broker_url: &str, policy: ReconnectPolicy) -> Self {
        let supervisor = ConnectionSupervisor::new(broker_url, "publisher").with_confirms().with_policy(policy);
        Self { supervisor: Arc::new(Mutex::new(supervisor)), policy }
    }

    /// Connects eagerly. Publishing connects on demand, so calling this is optional.
    pub async fn connect(&self) -> Result<(), QueueError> {
        self.supervisor.lock().await.connect_with_retry().await
    }

    pub async fn state(&self) -> SupervisorState {
        self.supervisor.lock().await.state()
    }

    pub async fn publish(&self, message: &WebhookMessage) -> Result<(), QueueError> {
        let payload = message.to_bytes()?;
        let mut supervisor = self.supervisor.lock().await;
        let max = self.policy.max_attempts();
        let mut reason = String::new();
        for attempt in 1..=max {
            let published = tokio::time::timeout(BROKER_TIMEOUT, publish_once(&mut supervisor, &payload))
                .await
                .unwrap_or_else(|_| Err(QueueError::Timeout(BROKER_TIMEOUT)));
            match published {
                Ok(()) => {
                    debug!("📨️ Webhook {message} queued on {QUEUE_NAME}");
                    return Ok(());
                },
                Err(e) => {
                    warn!("📨️ Publish attempt {attempt}/{max} for payment {} failed. {e}", message.payment_id());
                    supervisor.invalidate();
                    reason = e.to_string();
                    if attempt < max {
                        tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    }
                },
            }
        }
        error!("📨️ Could not queue webhook {message}. {reason}");
        Err(QueueError::PublishFailed { attempts: max, reason })
    }

    pub async fn close(&self) {
        self.supervisor.lock().await.close().await;
    }
}

async fn publish_once(supervisor: &mut ConnectionSupervisor, payload: &[u8]) -> Result<(), QueueError> {
    let channel = supervisor.channel().await?;
    let properties =
        BasicProperties::default().with_delivery_mode(PERSISTENT).with_content_type("application/json".into());
    let confirmation = channel
        .basic_publish("", QUEUE_NAME, BasicPublishOptions::default(), payload, properties)
        .await?
        .await?;
    if confirmation.is_nack() {
        return Err(QueueError::PublishRejected);
    }
    Ok(())
}

//--------------------------------------   InlineProcessor    ---------------------------------------------------------
/// Applies webhooks immediately, without a broker. There is no durability and no retry: if processing fails, the
/// error goes straight back to the caller.
#[derive(Clone)]
pub struct InlineProcessor<B> {
    api: PaymentFlowApi<B>,
}

impl<B> InlineProcessor<B>
where B: PaymentGatewayDatabase
{
    pub fn new(api: PaymentFlowApi<B>) -> Self {
        Self { api }
    }

    pub async fn publish(&self, message: &WebhookMessage) -> Result<(), QueueError> {
        let result = self.api.apply_webhook(message).await?;
        debug!("📨️ Webhook {message} processed inline: {result:?}");
        Ok(())
    }
}

//--------------------------------------   WebhookPublisher   ---------------------------------------------------------
/// Hands verified webhooks over for processing, either through the durable queue or inline.
#[derive(Clone)]
pub enum WebhookPublisher<B> {
    Durable(DurableQueue),
    Inline(InlineProcessor<B>),
}

impl<B> WebhookPublisher<B>
where B: PaymentGatewayDatabase
{
    pub fn from_config(config: &QueueConfig, api: PaymentFlowApi<B>) -> Self {
        match config.mode {
            QueueMode::Durable => Self::Durable(DurableQueue::new(config.broker_url.reveal(), config.publish_retry)),
            QueueMode::Inline => Self::Inline(InlineProcessor::new(api)),
        }
    }

    pub fn mode(&self) -> QueueMode {
        match self {
            WebhookPublisher::Durable(_) => QueueMode::Durable,
            WebhookPublisher::Inline(_) => QueueMode::Inline,
        }
    }

    pub async fn publish(&self, message: &WebhookMessage) -> Result<(), QueueError> {
        match self {
            WebhookPublisher::Durable(queue) => queue.publish(message).await,
            WebhookPublisher::Inline(processor) => processor.publish(message).await,
        }
    }

    pub async fn close(&self) {
        if let WebhookPublisher::Durable(queue) = self {
            queue.close().await;
        }
    }
}
