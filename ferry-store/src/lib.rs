pub mod app_config;
pub mod events;
pub mod memory;

pub use events::EventProducer;
pub use memory::{MemoryBookingRepository, MemoryChatRepository, MemoryFerryRepository};
