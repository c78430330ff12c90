use ferry_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

pub const CURRENCY: &str = "KES";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Mpesa,
    Card,
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn parse(raw: &str) -> Result<PaymentMethod, ValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mpesa" => Ok(PaymentMethod::Mpesa),
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            "bank" => Ok(PaymentMethod::Bank),
            other => Err(ValidationError::new(
                "payment_method",
                format!("unsupported payment method '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
        }
    }
}

/// Payment state carried on a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentDetails {
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub amount_paid: i32,
    pub currency: String,
    pub transaction_ref: Option<Masked<String>>,
}

impl PaymentDetails {
    pub fn pending(method: PaymentMethod) -> Self {
        Self {
            status: PaymentStatus::Pending,
            method,
            amount_paid: 0,
            currency: CURRENCY.to_string(),
            transaction_ref: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Delivered by the payment provider once money has actually moved.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    pub transaction_ref: String,
    pub amount_paid: i32,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
}

impl PaymentConfirmation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.transaction_ref.trim().is_empty() {
            return Err(ValidationError::new("transaction_ref", "must not be blank"));
        }
        if self.amount_paid < 0 {
            return Err(ValidationError::new("amount_paid", "must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(PaymentMethod::parse("MPESA").unwrap(), PaymentMethod::Mpesa);
        assert_eq!(PaymentMethod::parse("bank").unwrap(), PaymentMethod::Bank);
        let err = PaymentMethod::parse("cheque").unwrap_err();
        assert_eq!(err.field, "payment_method");
    }

    #[test]
    fn test_confirmation_validation() {
        let ok = PaymentConfirmation {
            transaction_ref: "QAB12".to_string(),
            amount_paid: 200,
            method: None,
        };
        assert!(ok.validate().is_ok());

        let blank = PaymentConfirmation { transaction_ref: "  ".to_string(), ..ok.clone() };
        assert_eq!(blank.validate().unwrap_err().field, "transaction_ref");

        let negative = PaymentConfirmation { amount_paid: -1, ..ok };
        assert_eq!(negative.validate().unwrap_err().field, "amount_paid");
    }
}
