//! Booking lifecycle façade.
//!
//! Every operation loads the booking, checks who is asking, applies the
//! change through [`modify_booking`] (or the occupancy accountant for ferry
//! assignment) and publishes events only once the write has landed.

use chrono::Utc;
use ferry_core::booking::{validate_create, Booking, NewBooking, Rating};
use ferry_core::events::EventPublisher;
use ferry_core::payment::{PaymentConfirmation, PaymentStatus, CURRENCY};
use ferry_core::repository::{
    modify_booking, BookingRepository, BookingUpdate, FerryRepository, Mutation,
};
use ferry_core::status::BookingStatus;
use ferry_core::{check_transition, Actor, CoreError, CoreResult, Role, Transition};
use ferry_fleet::occupancy::occupancy_changed;
use ferry_fleet::OccupancyAccountant;
use ferry_shared::models::events::{BookingPaidEvent, BookingStatusChangedEvent, FerryEvent};
use ferry_shared::Masked;
use ferry_store::app_config::BusinessRules;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct LifecycleService {
    pub(crate) bookings: Arc<dyn BookingRepository>,
    pub(crate) ferries: Arc<dyn FerryRepository>,
    accountant: Arc<OccupancyAccountant>,
    events: Arc<dyn EventPublisher>,
    pub(crate) rules: BusinessRules,
}

impl LifecycleService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        ferries: Arc<dyn FerryRepository>,
        accountant: Arc<OccupancyAccountant>,
        events: Arc<dyn EventPublisher>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            bookings,
            ferries,
            accountant,
            events,
            rules,
        }
    }

    /// Validates and stores a new pending booking owned by the caller.
    pub async fn create(&self, actor: &Actor, input: &NewBooking) -> CoreResult<Booking> {
        actor.require_passenger("create bookings")?;
        let booking = validate_create(actor.id, input, Utc::now())?;
        self.bookings.insert(&booking).await?;

        info!(
            "Created {} booking {} for {} on {}",
            booking.kind(),
            booking.id,
            booking.owner_id,
            booking.travel_date
        );
        Ok(booking)
    }

    /// Owner-only. Cancelling an assigned booking gives its seat back.
    pub async fn cancel(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<Booking> {
        self.transition(booking_id, actor, BookingStatus::Cancelled).await
    }

    pub async fn approve(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<Booking> {
        self.transition(booking_id, actor, BookingStatus::Approved).await
    }

    pub async fn complete(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<Booking> {
        self.transition(booking_id, actor, BookingStatus::Completed).await
    }

    pub async fn assign(
        &self,
        booking_id: Uuid,
        ferry_id: Uuid,
        actor: &Actor,
    ) -> CoreResult<Booking> {
        let assignment = self.accountant.try_assign(booking_id, ferry_id, actor).await?;
        let update = assignment.update;

        if update.changed {
            self.publish_status_change(&update, actor, None).await;
            self.events
                .publish(occupancy_changed(ferry_id, assignment.occupancy))
                .await;
        }
        Ok(update.booking)
    }

    /// Ratings are 1..=5, accepted once, and only from the owner of a
    /// confirmed, paid booking.
    pub async fn rate(&self, booking_id: Uuid, actor: &Actor, rating: i64) -> CoreResult<Booking> {
        let rating = Rating::new(rating)?;

        let update = modify_booking(
            self.bookings.as_ref(),
            booking_id,
            self.rules.max_write_attempts,
            |booking| {
                if !actor.owns(booking.owner_id) {
                    return Err(CoreError::forbidden("only the booking owner may rate it"));
                }
                if booking.rating.is_some() {
                    return Err(CoreError::validation("rating", "has already been submitted"));
                }
                if !booking.is_confirmed_and_paid() {
                    return Err(CoreError::validation(
                        "rating",
                        "only approved or assigned bookings that are paid can be rated",
                    ));
                }
                booking.rating = Some(rating);
                booking.touch();
                Ok(Mutation::Write)
            },
        )
        .await?;

        info!("Booking {} rated {}", booking_id, rating.value());
        Ok(update.booking)
    }

    /// Records a confirmed payment. Only the payment webhook calls this.
    /// Replaying the same reference is a no-op.
    pub async fn mark_paid(
        &self,
        booking_id: Uuid,
        confirmation: &PaymentConfirmation,
    ) -> CoreResult<Booking> {
        confirmation.validate()?;
        let reference = confirmation.transaction_ref.trim().to_string();

        let update = modify_booking(
            self.bookings.as_ref(),
            booking_id,
            self.rules.max_write_attempts,
            |booking| {
                if booking.payment.is_paid() {
                    let same = booking
                        .payment
                        .transaction_ref
                        .as_ref()
                        .is_some_and(|r| r.expose() == &reference);
                    return if same {
                        Ok(Mutation::Unchanged)
                    } else {
                        Err(CoreError::validation(
                            "transaction_ref",
                            "booking is already paid under a different reference",
                        ))
                    };
                }
                if booking.status == BookingStatus::Cancelled {
                    return Err(CoreError::validation(
                        "booking_status",
                        "a cancelled booking cannot be paid",
                    ));
                }

                booking.payment.status = PaymentStatus::Paid;
                booking.payment.amount_paid = confirmation.amount_paid;
                booking.payment.currency = CURRENCY.to_string();
                booking.payment.transaction_ref = Some(Masked(reference.clone()));
                if let Some(method) = confirmation.method {
                    booking.payment.method = method;
                }
                booking.touch();
                Ok(Mutation::Write)
            },
        )
        .await?;

        if update.changed {
            let booking = &update.booking;
            info!(
                "Booking {} paid {} {} via {}",
                booking.id,
                booking.payment.amount_paid,
                booking.payment.currency,
                booking.payment.method.as_str()
            );
            self.events
                .publish(FerryEvent::BookingPaid(BookingPaidEvent {
                    booking_id: booking.id,
                    owner_id: booking.owner_id,
                    transaction_ref: Masked(reference),
                    amount_paid: booking.payment.amount_paid,
                    currency: booking.payment.currency.clone(),
                    timestamp: Utc::now().timestamp(),
                }))
                .await;
        }
        Ok(update.booking)
    }

    /// Dispatches a raw status request to the matching operation.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        requested: &str,
        ferry_id: Option<Uuid>,
    ) -> CoreResult<Booking> {
        let requested = BookingStatus::parse(requested).ok_or_else(|| {
            CoreError::validation("booking_status", format!("'{}' is not a booking status", requested))
        })?;

        match requested {
            BookingStatus::Approved => self.approve(booking_id, actor).await,
            BookingStatus::Completed => self.complete(booking_id, actor).await,
            BookingStatus::Cancelled => self.cancel(booking_id, actor).await,
            BookingStatus::Assigned => match ferry_id {
                Some(ferry_id) => self.assign(booking_id, ferry_id, actor).await,
                None => Err(CoreError::validation("ferry_id", "is required to assign a ferry")),
            },
            BookingStatus::Pending => {
                let booking = self.get(booking_id, actor).await?;
                if booking.status == BookingStatus::Pending {
                    Ok(booking)
                } else {
                    Err(CoreError::InvalidTransition {
                        from: booking.status,
                        to: BookingStatus::Pending,
                    })
                }
            }
        }
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        requested: BookingStatus,
    ) -> CoreResult<Booking> {
        let mut released = None;

        let update = modify_booking(
            self.bookings.as_ref(),
            booking_id,
            self.rules.max_write_attempts,
            |booking| {
                if actor.role == Role::Passenger && !actor.owns(booking.owner_id) {
                    return Err(CoreError::forbidden("passengers may only act on their own bookings"));
                }
                match check_transition(booking.status, requested, actor.role)? {
                    Transition::NoOp => Ok(Mutation::Unchanged),
                    Transition::Apply => {
                        released = (booking.status == BookingStatus::Assigned)
                            .then_some(booking.assigned_ferry)
                            .flatten();
                        booking.transition_to(requested);
                        Ok(Mutation::Write)
                    }
                }
            },
        )
        .await?;

        if update.changed {
            self.publish_status_change(&update, actor, released).await;
            if let Some(ferry_id) = released {
                self.publish_occupancy(ferry_id).await;
            }
        }
        Ok(update.booking)
    }

    async fn publish_status_change(
        &self,
        update: &BookingUpdate,
        actor: &Actor,
        released: Option<Uuid>,
    ) {
        let booking = &update.booking;
        info!(
            "Booking {} moved {} -> {} by {}",
            booking.id, update.previous_status, booking.status, actor.role
        );
        self.events
            .publish(FerryEvent::BookingStatusChanged(BookingStatusChangedEvent {
                booking_id: booking.id,
                owner_id: booking.owner_id,
                ferry_id: booking.assigned_ferry.or(released),
                from: update.previous_status.to_string(),
                to: booking.status.to_string(),
                actor_role: actor.role.to_string(),
                timestamp: Utc::now().timestamp(),
            }))
            .await;
    }

    async fn publish_occupancy(&self, ferry_id: Uuid) {
        match self.accountant.occupancy(ferry_id).await {
            Ok(occupancy) => {
                self.events
                    .publish(occupancy_changed(ferry_id, occupancy))
                    .await
            }
            Err(e) => warn!("Could not read occupancy of ferry {}: {}", ferry_id, e),
        }
    }
}
