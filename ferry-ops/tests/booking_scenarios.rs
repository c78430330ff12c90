use chrono::{Days, Utc};
use ferry_core::booking::NewBooking;
use ferry_core::events::NoopPublisher;
use ferry_core::ferry::{NewFerry, Occupancy};
use ferry_core::payment::PaymentStatus;
use ferry_core::status::BookingStatus;
use ferry_core::{Actor, CoreError, Role};
use ferry_fleet::{FerryLocks, FerryRegistry, OccupancyAccountant};
use ferry_ops::LifecycleService;
use ferry_store::app_config::BusinessRules;
use ferry_store::{MemoryBookingRepository, MemoryFerryRepository};
use std::sync::Arc;
use uuid::Uuid;

struct Desk {
    service: LifecycleService,
    registry: FerryRegistry,
}

fn desk() -> Desk {
    let bookings = Arc::new(MemoryBookingRepository::new());
    let ferries = Arc::new(MemoryFerryRepository::new());
    let accountant = Arc::new(OccupancyAccountant::new(
        bookings.clone(),
        ferries.clone(),
        Arc::new(FerryLocks::new()),
        5,
    ));
    let registry = FerryRegistry::new(
        ferries.clone(),
        bookings.clone(),
        accountant.clone(),
        Arc::new(NoopPublisher),
    );
    let service = LifecycleService::new(
        bookings,
        ferries,
        accountant,
        Arc::new(NoopPublisher),
        BusinessRules::default(),
    );
    Desk { service, registry }
}

fn tomorrow_trip() -> NewBooking {
    NewBooking {
        kind: Some("passenger".to_string()),
        travel_date: Some((Utc::now().date_naive() + Days::new(1)).to_string()),
        travel_time: Some("07:00".to_string()),
        route: Some("Mombasa-Likoni".to_string()),
        num_passengers: Some(2),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_passenger_booking_is_approved_by_staff() {
    let desk = desk();
    let passenger = Actor::passenger(Uuid::new_v4());
    let staff = Actor::staff(Uuid::new_v4());

    let booking = desk.service.create(&passenger, &tomorrow_trip()).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment.status, PaymentStatus::Pending);

    assert!(matches!(
        desk.service.approve(booking.id, &passenger).await,
        Err(CoreError::Forbidden(_))
    ));
    let approved = desk.service.approve(booking.id, &staff).await.unwrap();
    assert_eq!(approved.status, BookingStatus::Approved);
}

#[tokio::test]
async fn test_third_booking_on_full_ferry_is_rejected() {
    let desk = desk();
    let admin = Actor::new(Uuid::new_v4(), Role::Admin);
    let crew = Actor::new(Uuid::new_v4(), Role::Crew);

    let kilindini = desk
        .registry
        .create(
            &admin,
            &NewFerry {
                name: "MV Kilindini".to_string(),
                capacity: 2,
            },
        )
        .await
        .unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let passenger = Actor::passenger(Uuid::new_v4());
        ids.push(desk.service.create(&passenger, &tomorrow_trip()).await.unwrap().id);
    }

    desk.service.assign(ids[0], kilindini.id, &crew).await.unwrap();
    desk.service.assign(ids[1], kilindini.id, &crew).await.unwrap();
    let full = Occupancy {
        capacity: 2,
        occupied: 2,
        remaining: 0,
    };
    assert_eq!(desk.registry.occupancy(&crew, kilindini.id).await.unwrap(), full);

    assert!(matches!(
        desk.service.assign(ids[2], kilindini.id, &crew).await,
        Err(CoreError::CapacityExceeded { .. })
    ));
    assert_eq!(desk.registry.occupancy(&crew, kilindini.id).await.unwrap(), full);

    assert!(matches!(
        desk.registry.delete(&admin, kilindini.id).await,
        Err(CoreError::FerryInUse { assigned: 2, .. })
    ));
}

#[tokio::test]
async fn test_cancelled_booking_accepts_only_cancel() {
    let desk = desk();
    let passenger = Actor::passenger(Uuid::new_v4());
    let staff = Actor::staff(Uuid::new_v4());
    let booking = desk.service.create(&passenger, &tomorrow_trip()).await.unwrap();

    desk.service.cancel(booking.id, &passenger).await.unwrap();
    let again = desk.service.cancel(booking.id, &passenger).await.unwrap();
    assert_eq!(again.status, BookingStatus::Cancelled);

    for requested in ["approved", "completed"] {
        let err = desk
            .service
            .update_status(booking.id, &staff, requested, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { from: BookingStatus::Cancelled, .. }));
    }
    assert!(matches!(
        desk.service.update_status(booking.id, &passenger, "pending", None).await,
        Err(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_out_of_range_rating_is_always_invalid() {
    let desk = desk();
    let passenger = Actor::passenger(Uuid::new_v4());
    let booking = desk.service.create(&passenger, &tomorrow_trip()).await.unwrap();

    for rating in [0, 6, -1] {
        let err = desk.service.rate(booking.id, &passenger, rating).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref e) if e.field == "rating"));
    }
    // even for a booking that does not exist
    let err = desk.service.rate(Uuid::new_v4(), &passenger, 6).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
