use chrono::Utc;
use ferry_core::booking::{Booking, NewBooking};
use ferry_core::ferry::Ferry;
use ferry_core::repository::FerryRepository;
use ferry_core::Actor;
use ferry_fleet::{FerryLocks, OccupancyAccountant};
use ferry_store::app_config::BusinessRules;
use ferry_store::{EventProducer, MemoryBookingRepository, MemoryFerryRepository};
use std::sync::Arc;
use uuid::Uuid;

use crate::LifecycleService;

pub struct Harness {
    pub service: LifecycleService,
    pub bookings: Arc<MemoryBookingRepository>,
    pub ferries: Arc<MemoryFerryRepository>,
    pub accountant: Arc<OccupancyAccountant>,
    pub events: EventProducer,
    pub staff: Actor,
}

impl Harness {
    pub fn new() -> Self {
        let bookings = Arc::new(MemoryBookingRepository::new());
        let ferries = Arc::new(MemoryFerryRepository::new());
        let rules = BusinessRules::default();
        let accountant = Arc::new(OccupancyAccountant::new(
            bookings.clone(),
            ferries.clone(),
            Arc::new(FerryLocks::new()),
            rules.max_write_attempts,
        ));
        let events = EventProducer::new(64);
        let service = LifecycleService::new(
            bookings.clone(),
            ferries.clone(),
            accountant.clone(),
            Arc::new(events.clone()),
            rules,
        );
        Self {
            service,
            bookings,
            ferries,
            accountant,
            events,
            staff: Actor::staff(Uuid::new_v4()),
        }
    }

    pub fn passenger_request() -> NewBooking {
        NewBooking {
            kind: Some("passenger".to_string()),
            travel_date: Some((Utc::now().date_naive() + chrono::Days::new(1)).to_string()),
            travel_time: Some("08:30".to_string()),
            route: Some("Mombasa-Likoni".to_string()),
            num_passengers: Some(2),
            ..Default::default()
        }
    }

    pub async fn pending_booking(&self) -> (Actor, Booking) {
        let owner = Actor::passenger(Uuid::new_v4());
        let booking = self
            .service
            .create(&owner, &Self::passenger_request())
            .await
            .unwrap();
        (owner, booking)
    }

    pub async fn ferry(&self, name: &str, capacity: i64) -> Ferry {
        let ferry = Ferry::new(name, capacity, Utc::now()).unwrap();
        self.ferries.insert(&ferry).await.unwrap();
        ferry
    }
}
