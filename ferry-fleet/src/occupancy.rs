//! Capacity accounting for ferries.
//!
//! A ferry's occupancy is the number of bookings currently `assigned` to it.
//! Assignment reads that count and writes the booking while holding the
//! ferry's guard from [`FerryLocks`], so two assignments to the same ferry can
//! never both observe the last free seat.

use chrono::Utc;
use ferry_core::ferry::{Ferry, FerryOccupancy, Occupancy};
use ferry_core::repository::{
    modify_booking, BookingRepository, BookingUpdate, FerryRepository, Mutation,
};
use ferry_core::status::BookingStatus;
use ferry_core::{check_transition, Actor, CoreError, CoreResult, Transition};
use ferry_shared::models::events::{FerryEvent, OccupancyChangedEvent};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

use crate::locks::FerryLocks;

/// Result of a successful `try_assign`, with the ferry's load right after it.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub update: BookingUpdate,
    pub occupancy: Occupancy,
}

pub struct OccupancyAccountant {
    bookings: Arc<dyn BookingRepository>,
    ferries: Arc<dyn FerryRepository>,
    locks: Arc<FerryLocks>,
    max_write_attempts: u32,
}

impl OccupancyAccountant {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        ferries: Arc<dyn FerryRepository>,
        locks: Arc<FerryLocks>,
        max_write_attempts: u32,
    ) -> Self {
        Self {
            bookings,
            ferries,
            locks,
            max_write_attempts,
        }
    }

    pub fn locks(&self) -> &Arc<FerryLocks> {
        &self.locks
    }

    /// Takes the ferry's guard and loads it. Unknown ids are turned away
    /// before a scope exists for them, and a ferry deleted while we waited
    /// leaves no scope behind.
    pub async fn lock_ferry(&self, ferry_id: Uuid) -> CoreResult<(OwnedMutexGuard<()>, Ferry)> {
        if self.ferries.get(ferry_id).await?.is_none() {
            return Err(CoreError::not_found("ferry", ferry_id));
        }

        let guard = self.locks.acquire(ferry_id).await;
        let failure = match self.ferries.get(ferry_id).await {
            Ok(Some(ferry)) => return Ok((guard, ferry)),
            Ok(None) => CoreError::not_found("ferry", ferry_id),
            Err(err) => err.into(),
        };
        drop(guard);
        self.locks.release_idle(ferry_id).await;
        Err(failure)
    }

    /// Assigns `booking_id` to `ferry_id` if the ferry is active and has a
    /// free seat. A full ferry yields `CapacityExceeded` and nothing is
    /// written. Re-assigning a booking to the ferry it already holds is a
    /// no-op; moving it to another ferry is an invalid transition.
    pub async fn try_assign(
        &self,
        booking_id: Uuid,
        ferry_id: Uuid,
        actor: &Actor,
    ) -> CoreResult<Assignment> {
        actor.require_elevated("assign bookings to ferries")?;

        let (_guard, ferry) = self.lock_ferry(ferry_id).await?;
        if !ferry.is_active() {
            return Err(CoreError::not_found("ferry", ferry_id));
        }
        let occupied = self.bookings.count_assigned(ferry_id).await?;
        let role = actor.role;

        let result = modify_booking(
            self.bookings.as_ref(),
            booking_id,
            self.max_write_attempts,
            |booking| match check_transition(booking.status, BookingStatus::Assigned, role)? {
                Transition::NoOp if booking.assigned_ferry == Some(ferry_id) => {
                    Ok(Mutation::Unchanged)
                }
                Transition::NoOp => Err(CoreError::InvalidTransition {
                    from: BookingStatus::Assigned,
                    to: BookingStatus::Assigned,
                }),
                Transition::Apply if Occupancy::new(ferry.capacity, occupied).is_full() => {
                    Err(CoreError::CapacityExceeded {
                        ferry_id,
                        capacity: ferry.capacity,
                        occupied,
                    })
                }
                Transition::Apply => {
                    booking.assign_to(ferry_id);
                    Ok(Mutation::Write)
                }
            },
        )
        .await;

        let update = match result {
            Ok(update) => update,
            Err(err) => {
                if let CoreError::CapacityExceeded { .. } = err {
                    warn!(
                        "Rejected booking {} on ferry {}: full ({}/{})",
                        booking_id, ferry.name, occupied, ferry.capacity
                    );
                }
                return Err(err);
            }
        };

        let occupied = if update.changed { occupied + 1 } else { occupied };
        if update.changed {
            info!(
                "Assigned booking {} to ferry {} ({}/{})",
                booking_id, ferry.name, occupied, ferry.capacity
            );
        }

        Ok(Assignment {
            update,
            occupancy: Occupancy::new(ferry.capacity, occupied),
        })
    }

    /// Current load of a ferry. Inactive ferries still report their numbers.
    pub async fn occupancy(&self, ferry_id: Uuid) -> CoreResult<Occupancy> {
        let ferry = self
            .ferries
            .get(ferry_id)
            .await?
            .ok_or_else(|| CoreError::not_found("ferry", ferry_id))?;
        let occupied = self.bookings.count_assigned(ferry_id).await?;
        Ok(Occupancy::new(ferry.capacity, occupied))
    }

    pub async fn fleet_occupancy(&self) -> CoreResult<Vec<FerryOccupancy>> {
        let ferries = self.ferries.list().await?;
        let mut board = Vec::with_capacity(ferries.len());
        for ferry in ferries {
            let occupied = self.bookings.count_assigned(ferry.id).await?;
            board.push(FerryOccupancy {
                ferry_id: ferry.id,
                name: ferry.name,
                status: ferry.status,
                occupancy: Occupancy::new(ferry.capacity, occupied),
            });
        }
        Ok(board)
    }
}

pub fn occupancy_changed(ferry_id: Uuid, occupancy: Occupancy) -> FerryEvent {
    FerryEvent::OccupancyChanged(OccupancyChangedEvent {
        ferry_id,
        capacity: occupancy.capacity,
        occupied: occupancy.occupied,
        remaining: occupancy.remaining,
        timestamp: Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::booking::{validate_create, Booking, NewBooking};
    use ferry_core::ferry::OperationalStatus;
    use ferry_store::{MemoryBookingRepository, MemoryFerryRepository};

    struct Fixture {
        bookings: Arc<MemoryBookingRepository>,
        ferries: Arc<MemoryFerryRepository>,
        accountant: OccupancyAccountant,
    }

    fn fixture() -> Fixture {
        let bookings = Arc::new(MemoryBookingRepository::new());
        let ferries = Arc::new(MemoryFerryRepository::new());
        let accountant = OccupancyAccountant::new(
            bookings.clone(),
            ferries.clone(),
            Arc::new(FerryLocks::new()),
            5,
        );
        Fixture {
            bookings,
            ferries,
            accountant,
        }
    }

    async fn pending_booking(repo: &MemoryBookingRepository) -> Booking {
        let input = NewBooking {
            kind: Some("passenger".to_string()),
            travel_date: Some("2026-10-17".to_string()),
            travel_time: Some("08:30".to_string()),
            route: Some("Mombasa-Likoni".to_string()),
            num_passengers: Some(2),
            ..Default::default()
        };
        let booking = validate_create(Uuid::new_v4(), &input, Utc::now()).unwrap();
        repo.insert(&booking).await.unwrap();
        booking
    }

    async fn ferry(repo: &MemoryFerryRepository, name: &str, capacity: i64) -> Ferry {
        let ferry = Ferry::new(name, capacity, Utc::now()).unwrap();
        repo.insert(&ferry).await.unwrap();
        ferry
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let fx = fixture();
        let staff = Actor::staff(Uuid::new_v4());
        let kilindini = ferry(&fx.ferries, "MV Kilindini", 2).await;

        let a = pending_booking(&fx.bookings).await;
        let b = pending_booking(&fx.bookings).await;
        let c = pending_booking(&fx.bookings).await;

        fx.accountant.try_assign(a.id, kilindini.id, &staff).await.unwrap();
        let second = fx.accountant.try_assign(b.id, kilindini.id, &staff).await.unwrap();
        assert_eq!(second.occupancy, Occupancy::new(2, 2));

        let err = fx.accountant.try_assign(c.id, kilindini.id, &staff).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::CapacityExceeded { capacity: 2, occupied: 2, .. }
        ));

        let occupancy = fx.accountant.occupancy(kilindini.id).await.unwrap();
        assert_eq!(
            occupancy,
            Occupancy {
                capacity: 2,
                occupied: 2,
                remaining: 0
            }
        );
        let untouched = fx.bookings.get(c.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, BookingStatus::Pending);
        assert_eq!(untouched.assigned_ferry, None);
        assert_eq!(untouched.version, 0);
    }

    #[tokio::test]
    async fn test_inactive_or_missing_ferry_is_not_found() {
        let fx = fixture();
        let staff = Actor::staff(Uuid::new_v4());
        let booking = pending_booking(&fx.bookings).await;

        let err = fx
            .accountant
            .try_assign(booking.id, Uuid::new_v4(), &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "ferry", .. }));

        let mut docked = ferry(&fx.ferries, "MV Likoni", 10).await;
        docked.status = OperationalStatus::Inactive;
        fx.ferries.update(&docked).await.unwrap();
        let err = fx
            .accountant
            .try_assign(booking.id, docked.id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "ferry", .. }));
    }

    #[tokio::test]
    async fn test_repeat_assignment_is_noop_and_reassignment_is_rejected() {
        let fx = fixture();
        let staff = Actor::staff(Uuid::new_v4());
        let first = ferry(&fx.ferries, "MV Harambee", 3).await;
        let second = ferry(&fx.ferries, "MV Nyayo", 3).await;
        let booking = pending_booking(&fx.bookings).await;

        fx.accountant.try_assign(booking.id, first.id, &staff).await.unwrap();
        let again = fx.accountant.try_assign(booking.id, first.id, &staff).await.unwrap();
        assert!(!again.update.changed);
        assert_eq!(again.occupancy.occupied, 1);

        let err = fx
            .accountant
            .try_assign(booking.id, second.id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(fx.accountant.occupancy(second.id).await.unwrap().occupied, 0);
    }

    #[tokio::test]
    async fn test_passenger_cannot_assign() {
        let fx = fixture();
        let kilindini = ferry(&fx.ferries, "MV Kilindini", 2).await;
        let booking = pending_booking(&fx.bookings).await;
        let owner = Actor::passenger(booking.owner_id);

        let err = fx
            .accountant
            .try_assign(booking.id, kilindini.id, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_fleet_board_lists_every_ferry() {
        let fx = fixture();
        let staff = Actor::staff(Uuid::new_v4());
        let busy = ferry(&fx.ferries, "MV Busy", 4).await;
        ferry(&fx.ferries, "MV Idle", 6).await;
        let booking = pending_booking(&fx.bookings).await;
        fx.accountant.try_assign(booking.id, busy.id, &staff).await.unwrap();

        let board = fx.accountant.fleet_occupancy().await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].name, "MV Busy");
        assert_eq!(board[0].occupancy, Occupancy::new(4, 1));
        assert_eq!(board[1].occupancy, Occupancy::new(6, 0));
    }

    #[tokio::test]
    async fn test_unknown_ferries_leave_no_lock_scopes() {
        let fx = fixture();
        let staff = Actor::staff(Uuid::new_v4());
        let booking = pending_booking(&fx.bookings).await;

        for _ in 0..100 {
            let err = fx
                .accountant
                .try_assign(booking.id, Uuid::new_v4(), &staff)
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::NotFound { entity: "ferry", .. }));
        }
        assert_eq!(fx.accountant.locks().tracked().await, 0);

        let kilindini = ferry(&fx.ferries, "MV Kilindini", 2).await;
        fx.accountant.try_assign(booking.id, kilindini.id, &staff).await.unwrap();
        assert_eq!(fx.accountant.locks().tracked().await, 1);
    }
}
