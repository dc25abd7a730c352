use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use payment_queue::QueueError;
use thiserror::Error;
use ticket_payment_engine::PaymentFlowError;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The webhook does not match our records. {0}")]
    WebhookMismatch(String),
    #[error("Queue error. {0}")]
    QueueError(#[from] QueueError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::WebhookMismatch(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::QueueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(JsonResponse::failure(self))
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentFlowError::OrderMismatch { .. } => Self::WebhookMismatch(e.to_string()),
            PaymentFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
