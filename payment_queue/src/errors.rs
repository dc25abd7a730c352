use std::time::Duration;

use thiserror::Error;
use ticket_payment_engine::{webhook_objects::WebhookMessageError, PaymentFlowError};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Could not connect to the message broker. {0}")]
    ConnectionError(#[from] lapin::Error),
    #[error("Gave up connecting to the message broker after {0} attempts")]
    RetriesExhausted(u32),
    #[error("The message broker did not respond within {0:?}")]
    Timeout(Duration),
    #[error("There is no open connection to the message broker")]
    NotConnected,
    #[error("The broker rejected the message")]
    PublishRejected,
    #[error("Could not publish the webhook after {attempts} attempts. {reason}")]
    PublishFailed { attempts: u32, reason: String },
    #[error("Could not decode the webhook message. {0}")]
    MessageError(#[from] WebhookMessageError),
    #[error("Could not process the webhook. {0}")]
    ProcessingError(#[from] PaymentFlowError),
    #[error("Could not acknowledge the delivery. {0}")]
    AcknowledgementError(String),
    #[error("The delivery stream from the broker has ended")]
    ConsumerClosed,
}
