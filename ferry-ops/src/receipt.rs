use chrono::NaiveDate;
use ferry_core::booking::BookingKind;
use ferry_core::payment::{PaymentMethod, PaymentStatus};
use ferry_core::repository::FerryRepository;
use ferry_core::status::BookingStatus;
use ferry_core::{Actor, CoreError, CoreResult};
use serde::Serialize;
use uuid::Uuid;

use crate::LifecycleService;

pub const UNASSIGNED_FERRY: &str = "Not yet assigned";

/// Everything printed on a booking receipt. Layout and PDF rendering happen
/// outside this crate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Receipt {
    pub booking_id: Uuid,
    pub kind: BookingKind,
    pub route: String,
    pub travel_date: NaiveDate,
    pub travel_time: String,
    pub details: String,
    pub amount_paid: i32,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub ferry: String,
    pub booked_on: NaiveDate,
}

impl LifecycleService {
    pub async fn receipt(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<Receipt> {
        let booking = self.get(booking_id, actor).await?;
        if !booking.is_confirmed_and_paid() {
            return Err(CoreError::forbidden(
                "receipts are only issued for approved or assigned bookings that are paid",
            ));
        }

        let ferry = match booking.assigned_ferry {
            Some(ferry_id) => self.ferries.get(ferry_id).await?.map(|f| f.name),
            None => None,
        };

        Ok(Receipt {
            booking_id: booking.id,
            kind: booking.kind(),
            details: booking.manifest.summary(),
            route: booking.route,
            travel_date: booking.travel_date,
            travel_time: booking.travel_time,
            amount_paid: booking.payment.amount_paid,
            currency: booking.payment.currency,
            payment_method: booking.payment.method,
            payment_status: booking.payment.status,
            booking_status: booking.status,
            ferry: ferry.unwrap_or_else(|| UNASSIGNED_FERRY.to_string()),
            booked_on: booking.created_at.date_naive(),
        })
    }
}
