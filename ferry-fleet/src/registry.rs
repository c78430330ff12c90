use chrono::Utc;
use ferry_core::events::EventPublisher;
use ferry_core::ferry::{
    validate_capacity, validate_name, Ferry, FerryOccupancy, FerryUpdate, FleetSummary, NewFerry,
    Occupancy,
};
use ferry_core::repository::{BookingQuery, BookingRepository, FerryRepository, StoreError};
use ferry_core::{Actor, CoreError, CoreResult};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::occupancy::{occupancy_changed, OccupancyAccountant};

/// Fleet management. Staff and admins edit ferries; crew may only look.
pub struct FerryRegistry {
    ferries: Arc<dyn FerryRepository>,
    bookings: Arc<dyn BookingRepository>,
    accountant: Arc<OccupancyAccountant>,
    events: Arc<dyn EventPublisher>,
}

fn require_fleet_manager(actor: &Actor) -> CoreResult<()> {
    if actor.role.can_manage_fleet() {
        Ok(())
    } else {
        Err(CoreError::forbidden(format!("{} may not manage the fleet", actor.role)))
    }
}

fn duplicate_name(err: StoreError) -> CoreError {
    match err {
        StoreError::Duplicate { value, .. } => {
            CoreError::validation("name", format!("a ferry named '{}' already exists", value))
        }
        other => other.into(),
    }
}

impl FerryRegistry {
    pub fn new(
        ferries: Arc<dyn FerryRepository>,
        bookings: Arc<dyn BookingRepository>,
        accountant: Arc<OccupancyAccountant>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            ferries,
            bookings,
            accountant,
            events,
        }
    }

    pub async fn create(&self, actor: &Actor, input: &NewFerry) -> CoreResult<Ferry> {
        require_fleet_manager(actor)?;
        let ferry = Ferry::new(&input.name, input.capacity, Utc::now())?;
        self.ferries.insert(&ferry).await.map_err(duplicate_name)?;

        info!("Registered ferry {} ({}) with capacity {}", ferry.name, ferry.id, ferry.capacity);
        Ok(ferry)
    }

    /// Applies a partial edit inside the ferry's exclusion scope so a capacity
    /// cut cannot race an assignment.
    pub async fn update(&self, actor: &Actor, ferry_id: Uuid, edit: &FerryUpdate) -> CoreResult<Ferry> {
        require_fleet_manager(actor)?;
        let (_guard, mut ferry) = self.accountant.lock_ferry(ferry_id).await?;
        let previous_capacity = ferry.capacity;

        if let Some(name) = &edit.name {
            ferry.name = validate_name(name)?;
        }
        if let Some(status) = edit.status {
            ferry.status = status;
        }
        let occupied = self.bookings.count_assigned(ferry_id).await?;
        if let Some(capacity) = edit.capacity {
            let capacity = validate_capacity(capacity)?;
            if capacity < occupied {
                return Err(CoreError::validation(
                    "capacity",
                    format!("cannot be lower than the {} bookings already assigned", occupied),
                ));
            }
            ferry.capacity = capacity;
        }
        ferry.updated_at = Utc::now();

        self.ferries.update(&ferry).await.map_err(duplicate_name)?;
        info!("Updated ferry {} ({})", ferry.name, ferry.id);

        if ferry.capacity != previous_capacity {
            self.events
                .publish(occupancy_changed(ferry.id, Occupancy::new(ferry.capacity, occupied)))
                .await;
        }
        Ok(ferry)
    }

    /// Rejected with `FerryInUse` while any booking is assigned to the ferry.
    pub async fn delete(&self, actor: &Actor, ferry_id: Uuid) -> CoreResult<()> {
        require_fleet_manager(actor)?;
        let (guard, _) = self.accountant.lock_ferry(ferry_id).await?;
        let assigned = self.bookings.count_assigned(ferry_id).await?;
        if assigned > 0 {
            return Err(CoreError::FerryInUse { ferry_id, assigned });
        }
        if !self.ferries.delete(ferry_id).await? {
            return Err(CoreError::not_found("ferry", ferry_id));
        }

        drop(guard);
        self.accountant.locks().forget(ferry_id).await;
        info!("Removed ferry {}", ferry_id);
        Ok(())
    }

    pub async fn list(&self, actor: &Actor) -> CoreResult<Vec<Ferry>> {
        actor.require_elevated("view the fleet")?;
        Ok(self.ferries.list().await?)
    }

    pub async fn occupancy(&self, actor: &Actor, ferry_id: Uuid) -> CoreResult<Occupancy> {
        actor.require_elevated("view ferry occupancy")?;
        self.accountant.occupancy(ferry_id).await
    }

    pub async fn fleet_occupancy(&self, actor: &Actor) -> CoreResult<Vec<FerryOccupancy>> {
        actor.require_elevated("view ferry occupancy")?;
        self.accountant.fleet_occupancy().await
    }

    pub async fn summary(&self, actor: &Actor) -> CoreResult<FleetSummary> {
        actor.require_elevated("view the fleet summary")?;
        let ferries = self.ferries.list().await?;
        let active_ferries = ferries.iter().filter(|f| f.is_active()).count();
        let bookings = self
            .bookings
            .find(&BookingQuery {
                limit: 1,
                ..Default::default()
            })
            .await?;

        Ok(FleetSummary {
            total_ferries: ferries.len(),
            active_ferries,
            inactive_ferries: ferries.len() - active_ferries,
            total_bookings: bookings.total,
        })
    }
}
