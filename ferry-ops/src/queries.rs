use ferry_core::booking::Booking;
use ferry_core::payment::PaymentStatus;
use ferry_core::repository::{BookingQuery, BookingRepository, Page};
use ferry_core::status::BookingStatus;
use ferry_core::{Actor, CoreError, CoreResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::LifecycleService;

/// Listing parameters as they arrive on a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl LifecycleService {
    fn query(&self, filter: &BookingFilter) -> BookingQuery {
        let limit = filter
            .limit
            .unwrap_or(self.rules.default_page_size)
            .clamp(1, self.rules.max_page_size.max(1));
        BookingQuery {
            status: filter.status,
            page: filter.page.unwrap_or(1).max(1),
            limit,
            ..Default::default()
        }
    }

    /// Owners and elevated roles only.
    pub async fn get(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("booking", booking_id))?;
        actor.require_owner_or_elevated(booking.owner_id, "view this booking")?;
        Ok(booking)
    }

    pub async fn list_mine(&self, actor: &Actor, filter: &BookingFilter) -> CoreResult<Page<Booking>> {
        actor.require_passenger("list their bookings")?;
        let query = BookingQuery {
            owner_id: Some(actor.id),
            ..self.query(filter)
        };
        Ok(self.bookings.find(&query).await?)
    }

    /// Passengers see their own paid bookings, elevated roles see all of them.
    pub async fn list_paid(&self, actor: &Actor, filter: &BookingFilter) -> CoreResult<Page<Booking>> {
        let owner_id = (!actor.role.is_elevated()).then_some(actor.id);
        let query = BookingQuery {
            owner_id,
            payment_status: Some(PaymentStatus::Paid),
            ..self.query(filter)
        };
        Ok(self.bookings.find(&query).await?)
    }

    pub async fn list_all(&self, actor: &Actor, filter: &BookingFilter) -> CoreResult<Page<Booking>> {
        actor.require_elevated("list all bookings")?;
        Ok(self.bookings.find(&self.query(filter)).await?)
    }
}
