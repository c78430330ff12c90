//! In-process document store backing the repository traits.

use async_trait::async_trait;
use ferry_core::booking::Booking;
use ferry_core::chat::{ChatMessage, Sender};
use ferry_core::ferry::Ferry;
use ferry_core::repository::{
    BookingQuery, BookingRepository, ChatRepository, FerryRepository, Page, StoreError,
    StoreResult,
};
use ferry_core::status::BookingStatus;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(StoreError::Duplicate {
                field: "booking id",
                value: booking.id.to_string(),
            });
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn replace(&self, booking: &Booking, expected_version: u64) -> StoreResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let current = bookings.get_mut(&booking.id).ok_or(StoreError::Missing {
            entity: "booking",
            id: booking.id,
        })?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: "booking",
                id: booking.id,
                expected: expected_version,
            });
        }

        let mut stored = booking.clone();
        stored.version = expected_version + 1;
        *current = stored.clone();
        Ok(stored)
    }

    async fn find(&self, query: &BookingQuery) -> StoreResult<Page<Booking>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<&Booking> = bookings.values().filter(|b| query.matches(b)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, query.page.max(1), query.limit))
    }

    async fn count_assigned(&self, ferry_id: Uuid) -> StoreResult<u32> {
        let bookings = self.bookings.read().await;
        let count = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Assigned && b.assigned_ferry == Some(ferry_id))
            .count();
        Ok(count as u32)
    }
}

#[derive(Default)]
pub struct MemoryFerryRepository {
    ferries: RwLock<HashMap<Uuid, Ferry>>,
}

impl MemoryFerryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(ferries: &HashMap<Uuid, Ferry>, name: &str, except: Uuid) -> bool {
    ferries.values().any(|f| f.id != except && f.name == name)
}

#[async_trait]
impl FerryRepository for MemoryFerryRepository {
    async fn insert(&self, ferry: &Ferry) -> StoreResult<()> {
        let mut ferries = self.ferries.write().await;
        if name_taken(&ferries, &ferry.name, ferry.id) {
            return Err(StoreError::Duplicate {
                field: "ferry name",
                value: ferry.name.clone(),
            });
        }
        ferries.insert(ferry.id, ferry.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Ferry>> {
        Ok(self.ferries.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Ferry>> {
        let mut ferries: Vec<Ferry> = self.ferries.read().await.values().cloned().collect();
        ferries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ferries)
    }

    async fn update(&self, ferry: &Ferry) -> StoreResult<()> {
        let mut ferries = self.ferries.write().await;
        if !ferries.contains_key(&ferry.id) {
            return Err(StoreError::Missing {
                entity: "ferry",
                id: ferry.id,
            });
        }
        if name_taken(&ferries, &ferry.name, ferry.id) {
            return Err(StoreError::Duplicate {
                field: "ferry name",
                value: ferry.name.clone(),
            });
        }
        ferries.insert(ferry.id, ferry.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.ferries.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryChatRepository {
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn append(&self, message: &ChatMessage) -> StoreResult<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn conversation(&self, passenger_id: Uuid) -> StoreResult<Vec<ChatMessage>> {
        let mut thread: Vec<ChatMessage> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.passenger_id == passenger_id)
            .cloned()
            .collect();
        // stable sort keeps insertion order for identical timestamps
        thread.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(thread)
    }

    async fn all(&self) -> StoreResult<Vec<ChatMessage>> {
        Ok(self.messages.read().await.clone())
    }

    async fn mark_read(&self, passenger_id: Uuid) -> StoreResult<usize> {
        let mut messages = self.messages.write().await;
        let mut changed = 0;
        for message in messages
            .iter_mut()
            .filter(|m| m.passenger_id == passenger_id && m.sender == Sender::Passenger && !m.read)
        {
            message.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
