use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;
use tpp_common::Cents;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct StatusConversionError(pub String);

//--------------------------------------     OrderId       ------------------------------------------------------------
/// Opaque order identifier, as issued by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------    PaymentId      ------------------------------------------------------------
/// Opaque payment identifier. One payment record is created per purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------   PaymentStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// The purchase attempt has started and the provider has not reported back yet.
    Pending,
    /// The provider confirmed the payment. Terminal.
    Paid,
    /// The provider declined the payment. Terminal.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    OrderStatus      ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The order has been placed, and is waiting on a successful payment.
    Pending,
    /// The order's payment was confirmed.
    Paid,
    /// The order was cancelled by the user or an admin.
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub event_id: String,
    pub quantity: i64,
    pub amount_cents: Cents,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: String,
    pub event_id: String,
    pub quantity: i64,
    pub amount_cents: Cents,
}

impl NewOrder {
    pub fn new(id: OrderId, user_id: String, event_id: String, quantity: i64, amount_cents: Cents) -> Self {
        Self { id, user_id, event_id, quantity, amount_cents }
    }
}

//--------------------------------------       Payment       ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Provider tag, e.g. "FAKEPAY"
    pub provider: String,
    pub status: PaymentStatus,
    /// Metadata snapshot taken when the attempt started (e.g. masked card data). Never interpreted here.
    pub payload: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub provider: String,
    pub status: PaymentStatus,
    pub payload: Value,
}

impl NewPayment {
    /// A new purchase attempt. Payments always start out as `Pending`.
    pub fn new(id: PaymentId, order_id: OrderId, provider: &str) -> Self {
        Self { id, order_id, provider: provider.to_string(), status: PaymentStatus::Pending, payload: Value::Null }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_strings() {
        assert_eq!(PaymentStatus::Paid.to_string(), "PAID");
        assert_eq!("FAILED".parse::<PaymentStatus>().unwrap(), PaymentStatus::Failed);
        assert!("paid".parse::<PaymentStatus>().is_err());
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }
}
