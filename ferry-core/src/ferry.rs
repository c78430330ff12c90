use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ferry {
    pub id: Uuid,
    pub name: String,
    pub capacity: u32,
    pub status: OperationalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ferry {
    pub fn new(name: &str, capacity: i64, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: validate_name(name)?,
            capacity: validate_capacity(capacity)?,
            status: OperationalStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == OperationalStatus::Active
    }
}

pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "is required"));
    }
    Ok(name.to_string())
}

pub fn validate_capacity(raw: i64) -> Result<u32, ValidationError> {
    if raw < 1 {
        return Err(ValidationError::new("capacity", "must be a positive integer"));
    }
    u32::try_from(raw).map_err(|_| ValidationError::new("capacity", "is too large"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFerry {
    pub name: String,
    pub capacity: i64,
}

/// Partial edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FerryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: Option<OperationalStatus>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occupancy {
    pub capacity: u32,
    pub occupied: u32,
    pub remaining: u32,
}

impl Occupancy {
    pub fn new(capacity: u32, occupied: u32) -> Self {
        Self {
            capacity,
            occupied,
            remaining: capacity.saturating_sub(occupied),
        }
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }
}

/// Headline counts for the operations dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetSummary {
    pub total_ferries: usize,
    pub active_ferries: usize,
    pub inactive_ferries: usize,
    pub total_bookings: u64,
}

/// One row of the fleet-wide occupancy board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FerryOccupancy {
    pub ferry_id: Uuid,
    pub name: String,
    pub status: OperationalStatus,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}
