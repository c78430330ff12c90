pub mod events;

pub use events::{BookingPaidEvent, BookingStatusChangedEvent, FerryEvent, OccupancyChangedEvent};
