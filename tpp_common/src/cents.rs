use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//----------------------------------------------     Cents       -------------------------------------------------------
/// A ticket price or order total, in the smallest unit of the storefront currency.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| CentsConversionError(format!("Value {value} is too large to convert to Cents")))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Cents::from(5000).to_string(), "50.00");
        assert_eq!(Cents::from(5).to_string(), "0.05");
        assert_eq!(Cents::from(-1234).to_string(), "-12.34");
    }

    #[test]
    fn conversion_from_u64() {
        assert_eq!(Cents::try_from(42u64).unwrap().value(), 42);
        assert!(Cents::try_from(u64::MAX).is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Cents::from(5000)).unwrap();
        assert_eq!(json, "5000");
        let cents: Cents = serde_json::from_str("1999").unwrap();
        assert_eq!(cents, Cents::from(1999));
    }
}
