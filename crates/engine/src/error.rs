//! The module contains the errors the engine can throw.
//!
//! Every failure surfaced by a write or query is one of these variants, so
//! callers can map each kind to a field-specific message instead of a
//! generic failure.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid quantity: {0}")]
    QuantityInvalid(String),
    #[error("Payments exceed total: {0}")]
    PaymentExceedsTotal(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Edit window expired: {0}")]
    EditWindowExpired(String),
    #[error("Cost is immutable: {0}")]
    CostImmutable(String),
    #[error("Already cancelled: {0}")]
    AlreadyCancelled(String),
    #[error("Cancel window expired: {0}")]
    CancelWindowExpired(String),
    #[error("Refund target required: {0}")]
    RefundRequired(String),
    #[error("Invalid refund target: {0}")]
    RefundTargetInvalid(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::QuantityInvalid(a), Self::QuantityInvalid(b)) => a == b,
            (Self::PaymentExceedsTotal(a), Self::PaymentExceedsTotal(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::EditWindowExpired(a), Self::EditWindowExpired(b)) => a == b,
            (Self::CostImmutable(a), Self::CostImmutable(b)) => a == b,
            (Self::AlreadyCancelled(a), Self::AlreadyCancelled(b)) => a == b,
            (Self::CancelWindowExpired(a), Self::CancelWindowExpired(b)) => a == b,
            (Self::RefundRequired(a), Self::RefundRequired(b)) => a == b,
            (Self::RefundTargetInvalid(a), Self::RefundTargetInvalid(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
