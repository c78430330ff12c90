use uuid::Uuid;

use crate::pii::Masked;

/// Emitted whenever a booking moves to a new status.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub owner_id: Uuid,
    pub ferry_id: Option<Uuid>,
    pub from: String,
    pub to: String,
    pub actor_role: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingPaidEvent {
    pub booking_id: Uuid,
    pub owner_id: Uuid,
    pub transaction_ref: Masked<String>,
    pub amount_paid: i32,
    pub currency: String,
    pub timestamp: i64,
}

/// Snapshot of a ferry's load right after an assignment or release.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OccupancyChangedEvent {
    pub ferry_id: Uuid,
    pub capacity: u32,
    pub occupied: u32,
    pub remaining: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FerryEvent {
    BookingStatusChanged(BookingStatusChangedEvent),
    BookingPaid(BookingPaidEvent),
    OccupancyChanged(OccupancyChangedEvent),
}

impl FerryEvent {
    /// Topic-style name, handy for log lines and SSE event names.
    pub fn name(&self) -> &'static str {
        match self {
            FerryEvent::BookingStatusChanged(_) => "booking.status_changed",
            FerryEvent::BookingPaid(_) => "booking.paid",
            FerryEvent::OccupancyChanged(_) => "ferry.occupancy_changed",
        }
    }

    /// The ferry this event concerns, if any.
    pub fn ferry_id(&self) -> Option<Uuid> {
        match self {
            FerryEvent::BookingStatusChanged(e) => e.ferry_id,
            FerryEvent::BookingPaid(_) => None,
            FerryEvent::OccupancyChanged(e) => Some(e.ferry_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let ferry_id = Uuid::new_v4();
        let event = FerryEvent::OccupancyChanged(OccupancyChangedEvent {
            ferry_id,
            capacity: 2,
            occupied: 1,
            remaining: 1,
            timestamp: 0,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "occupancy_changed");
        assert_eq!(value["occupied"], 1);
        assert_eq!(event.ferry_id(), Some(ferry_id));
        assert_eq!(event.name(), "ferry.occupancy_changed");
    }

    #[test]
    fn test_paid_event_has_no_ferry() {
        let event = FerryEvent::BookingPaid(BookingPaidEvent {
            booking_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            transaction_ref: Masked("QX12ABC".to_string()),
            amount_paid: 150,
            currency: "KES".to_string(),
            timestamp: 0,
        });
        assert!(event.ferry_id().is_none());
    }
}
