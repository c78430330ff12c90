pub mod booking;
pub mod chat;
pub mod events;
pub mod ferry;
pub mod identity;
pub mod payment;
pub mod repository;
pub mod status;

use uuid::Uuid;

use crate::repository::StoreError;
use crate::status::{BookingStatus, TransitionError};

pub use booking::{Booking, BookingKind, Manifest, NewBooking, Rating};
pub use identity::{Actor, Role};
pub use status::{can_transition, check_transition, Transition};

/// A rejected input, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("Ferry {ferry_id} is full ({occupied}/{capacity})")]
    CapacityExceeded {
        ferry_id: Uuid,
        capacity: u32,
        occupied: u32,
    },
    #[error("Ferry {ferry_id} still has {assigned} assigned bookings")]
    FerryInUse { ferry_id: Uuid, assigned: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(ValidationError::new(field, message))
    }
}

impl From<TransitionError> for CoreError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Forbidden { .. } => CoreError::Forbidden(err.to_string()),
            TransitionError::Invalid { from, to } => CoreError::InvalidTransition { from, to },
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
