use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::booking::Booking;
use crate::chat::ChatMessage;
use crate::ferry::Ferry;
use crate::payment::PaymentStatus;
use crate::status::BookingStatus;
use crate::{CoreError, CoreResult};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Stale write on {entity} {id}: expected version {expected}")]
    VersionConflict {
        entity: &'static str,
        id: Uuid,
        expected: u64,
    },
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("{entity} {id} is missing from the store")]
    Missing { entity: &'static str, id: Uuid },
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Secondary-lookup filter over bookings. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct BookingQuery {
    pub owner_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub assigned_ferry: Option<Uuid>,
    pub page: u32,
    pub limit: u32,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            owner_id: None,
            status: None,
            payment_status: None,
            assigned_ferry: None,
            page: 1,
            limit: 10,
        }
    }
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.owner_id.map_or(true, |id| booking.owner_id == id)
            && self.status.map_or(true, |s| booking.status == s)
            && self.payment_status.map_or(true, |p| booking.payment.status == p)
            && self.assigned_ferry.map_or(true, |f| booking.assigned_ferry == Some(f))
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Self {
            items,
            total,
            page,
            total_pages,
        }
    }
}

/// Document store for bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Compare-and-swap write: succeeds only if the stored version still
    /// equals `expected_version`, and returns the stored document with its
    /// version bumped.
    async fn replace(&self, booking: &Booking, expected_version: u64) -> StoreResult<Booking>;

    /// Newest first.
    async fn find(&self, query: &BookingQuery) -> StoreResult<Page<Booking>>;

    /// Bookings currently in `assigned` status on `ferry_id`.
    async fn count_assigned(&self, ferry_id: Uuid) -> StoreResult<u32>;
}

#[async_trait]
pub trait FerryRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the name is taken.
    async fn insert(&self, ferry: &Ferry) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Ferry>>;

    /// Sorted by name.
    async fn list(&self) -> StoreResult<Vec<Ferry>>;

    async fn update(&self, ferry: &Ferry) -> StoreResult<()>;

    /// Returns false when nothing was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn append(&self, message: &ChatMessage) -> StoreResult<()>;

    /// Oldest first.
    async fn conversation(&self, passenger_id: Uuid) -> StoreResult<Vec<ChatMessage>>;

    async fn all(&self) -> StoreResult<Vec<ChatMessage>>;

    /// Flags the passenger's unread messages as read and returns how many changed.
    async fn mark_read(&self, passenger_id: Uuid) -> StoreResult<usize>;
}

/// Outcome of a read-modify-write closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Write,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct BookingUpdate {
    pub booking: Booking,
    pub previous_status: BookingStatus,
    pub changed: bool,
}

/// Loads a booking, lets `mutate` edit it, and writes it back with an
/// optimistic version check. Stale writes are retried from a fresh read up to
/// `max_attempts` times. Errors returned by `mutate` abort without writing.
pub async fn modify_booking<F>(
    repo: &dyn BookingRepository,
    booking_id: Uuid,
    max_attempts: u32,
    mut mutate: F,
) -> CoreResult<BookingUpdate>
where
    F: FnMut(&mut Booking) -> CoreResult<Mutation> + Send,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let mut booking = repo
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("booking", booking_id))?;
        let previous_status = booking.status;
        let expected = booking.version;

        if mutate(&mut booking)? == Mutation::Unchanged {
            return Ok(BookingUpdate {
                booking,
                previous_status,
                changed: false,
            });
        }

        match repo.replace(&booking, expected).await {
            Ok(stored) => {
                return Ok(BookingUpdate {
                    booking: stored,
                    previous_status,
                    changed: true,
                })
            }
            Err(StoreError::VersionConflict { .. }) if attempt < max_attempts => {
                tracing::debug!(
                    "Concurrent write on booking {}, retrying ({}/{})",
                    booking_id,
                    attempt,
                    max_attempts
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}
