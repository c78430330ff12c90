use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::payment::{PaymentDetails, PaymentMethod};
use crate::status::BookingStatus;
use crate::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Passenger,
    Vehicle,
    Cargo,
}

impl BookingKind {
    pub fn parse(raw: &str) -> Result<BookingKind, ValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "passenger" => Ok(BookingKind::Passenger),
            "vehicle" => Ok(BookingKind::Vehicle),
            "cargo" => Ok(BookingKind::Cargo),
            other => Err(ValidationError::new(
                "kind",
                format!("expected passenger, vehicle or cargo, got '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Passenger => "passenger",
            BookingKind::Vehicle => "vehicle",
            BookingKind::Cargo => "cargo",
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the booking carries. One variant per kind, so a passenger booking
/// cannot also hold a vehicle plate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Manifest {
    Passenger {
        num_passengers: u32,
    },
    Vehicle {
        vehicle_type: String,
        vehicle_plate: String,
    },
    Cargo {
        cargo_description: String,
        cargo_weight_kg: f64,
    },
}

impl Manifest {
    pub fn kind(&self) -> BookingKind {
        match self {
            Manifest::Passenger { .. } => BookingKind::Passenger,
            Manifest::Vehicle { .. } => BookingKind::Vehicle,
            Manifest::Cargo { .. } => BookingKind::Cargo,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Manifest::Passenger { num_passengers } => format!("{} passenger(s)", num_passengers),
            Manifest::Vehicle {
                vehicle_type,
                vehicle_plate,
            } => format!("{} ({})", vehicle_type, vehicle_plate),
            Manifest::Cargo {
                cargo_description,
                cargo_weight_kg,
            } => format!("{} - {} kg", cargo_description, cargo_weight_kg),
        }
    }
}

/// Passenger rating, 1 to 5. Only paid bookings that are approved or assigned
/// accept one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Rating, ValidationError> {
        if (1..=5).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(ValidationError::new("rating", "must be between 1 and 5"))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.0 as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(flatten)]
    pub manifest: Manifest,
    pub travel_date: NaiveDate,
    pub travel_time: String,
    pub route: String,
    pub payment: PaymentDetails,
    pub status: BookingStatus,
    pub assigned_ferry: Option<Uuid>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful write.
    pub version: u64,
}

impl Booking {
    pub fn kind(&self) -> BookingKind {
        self.manifest.kind()
    }

    /// Moves to `next`, dropping the ferry reference when `next` cannot hold one.
    pub fn transition_to(&mut self, next: BookingStatus) {
        self.status = next;
        if !next.holds_ferry() {
            self.assigned_ferry = None;
        }
        self.touch();
    }

    pub fn assign_to(&mut self, ferry_id: Uuid) {
        self.assigned_ferry = Some(ferry_id);
        self.status = BookingStatus::Assigned;
        self.touch();
    }

    /// Ratings and receipts need a confirmed, paid trip.
    pub fn is_confirmed_and_paid(&self) -> bool {
        matches!(self.status, BookingStatus::Approved | BookingStatus::Assigned)
            && self.payment.is_paid()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Booking request as received from a client. Every field is optional here
/// so that missing input surfaces as a [`ValidationError`] naming the field
/// rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBooking {
    #[serde(default, alias = "booking_type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub travel_date: Option<String>,
    #[serde(default)]
    pub travel_time: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub num_passengers: Option<i64>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub cargo_description: Option<String>,
    #[serde(default)]
    pub cargo_weight_kg: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required_text(field: &str, value: &Option<String>) -> Result<String, ValidationError> {
    trimmed(value)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(field, "is required"))
}

fn parse_travel_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ValidationError::new("travel_date", format!("'{}' is not a calendar date", raw)))
}

impl NewBooking {
    fn reject_foreign_fields(&self, kind: BookingKind) -> Result<(), ValidationError> {
        let passenger = [("num_passengers", self.num_passengers.is_some())];
        let vehicle = [
            ("vehicle_type", trimmed(&self.vehicle_type).is_some()),
            ("vehicle_plate", trimmed(&self.vehicle_plate).is_some()),
        ];
        let cargo = [
            ("cargo_description", trimmed(&self.cargo_description).is_some()),
            ("cargo_weight_kg", self.cargo_weight_kg.is_some()),
        ];

        let foreign: Vec<(&str, bool)> = match kind {
            BookingKind::Passenger => vehicle.into_iter().chain(cargo).collect(),
            BookingKind::Vehicle => passenger.into_iter().chain(cargo).collect(),
            BookingKind::Cargo => passenger.into_iter().chain(vehicle).collect(),
        };

        match foreign.into_iter().find(|(_, present)| *present) {
            Some((field, _)) => Err(ValidationError::new(
                field,
                format!("not allowed on a {} booking", kind),
            )),
            None => Ok(()),
        }
    }

    fn manifest(&self, kind: BookingKind) -> Result<Manifest, ValidationError> {
        match kind {
            BookingKind::Passenger => {
                let count = self
                    .num_passengers
                    .ok_or_else(|| ValidationError::new("num_passengers", "is required"))?;
                if count < 1 {
                    return Err(ValidationError::new("num_passengers", "must be at least 1"));
                }
                let num_passengers = u32::try_from(count)
                    .map_err(|_| ValidationError::new("num_passengers", "is too large"))?;
                Ok(Manifest::Passenger { num_passengers })
            }
            BookingKind::Vehicle => Ok(Manifest::Vehicle {
                vehicle_type: required_text("vehicle_type", &self.vehicle_type)?,
                vehicle_plate: required_text("vehicle_plate", &self.vehicle_plate)?,
            }),
            BookingKind::Cargo => {
                let cargo_description = required_text("cargo_description", &self.cargo_description)?;
                let cargo_weight_kg = self
                    .cargo_weight_kg
                    .ok_or_else(|| ValidationError::new("cargo_weight_kg", "is required"))?;
                if !cargo_weight_kg.is_finite() || cargo_weight_kg < 0.0 {
                    return Err(ValidationError::new(
                        "cargo_weight_kg",
                        "must be a non-negative number",
                    ));
                }
                Ok(Manifest::Cargo {
                    cargo_description,
                    cargo_weight_kg,
                })
            }
        }
    }
}

/// Validates a booking request and builds the pending booking it describes.
pub fn validate_create(
    owner_id: Uuid,
    input: &NewBooking,
    now: DateTime<Utc>,
) -> Result<Booking, ValidationError> {
    let kind = match trimmed(&input.kind) {
        Some(raw) => BookingKind::parse(raw)?,
        None => return Err(ValidationError::new("kind", "is required")),
    };

    let travel_date = match trimmed(&input.travel_date) {
        Some(raw) => parse_travel_date(raw)?,
        None => return Err(ValidationError::new("travel_date", "is required")),
    };
    let travel_time = required_text("travel_time", &input.travel_time)?;
    let route = required_text("route", &input.route)?;

    input.reject_foreign_fields(kind)?;
    let manifest = input.manifest(kind)?;

    let method = match trimmed(&input.payment_method) {
        Some(raw) => PaymentMethod::parse(raw)?,
        None => PaymentMethod::default(),
    };

    Ok(Booking {
        id: Uuid::new_v4(),
        owner_id,
        manifest,
        travel_date,
        travel_time,
        route,
        payment: PaymentDetails::pending(method),
        status: BookingStatus::Pending,
        assigned_ferry: None,
        rating: None,
        created_at: now,
        updated_at: now,
        version: 0,
    })
}
