use ferry_fleet::{FerryLocks, FerryRegistry, OccupancyAccountant};
use ferry_ops::{ChatLog, LifecycleService};
use ferry_store::app_config::Config;
use ferry_store::{EventProducer, MemoryBookingRepository, MemoryChatRepository, MemoryFerryRepository};
use std::sync::Arc;

const EVENT_BUFFER: usize = 256;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleService>,
    pub fleet: Arc<FerryRegistry>,
    pub chat: Arc<ChatLog>,
    pub events: EventProducer,
    pub auth: AuthConfig,
    pub webhook_secret: String,
}

impl AppState {
    /// Wires every service onto the in-process document store.
    pub fn in_memory(config: &Config) -> Self {
        let bookings = Arc::new(MemoryBookingRepository::new());
        let ferries = Arc::new(MemoryFerryRepository::new());
        let events = EventProducer::new(EVENT_BUFFER);
        let rules = config.business_rules.clone();

        let accountant = Arc::new(OccupancyAccountant::new(
            bookings.clone(),
            ferries.clone(),
            Arc::new(FerryLocks::new()),
            rules.max_write_attempts,
        ));
        let fleet = FerryRegistry::new(
            ferries.clone(),
            bookings.clone(),
            accountant.clone(),
            Arc::new(events.clone()),
        );
        let lifecycle = LifecycleService::new(
            bookings,
            ferries,
            accountant,
            Arc::new(events.clone()),
            rules,
        );
        let chat = ChatLog::new(Arc::new(MemoryChatRepository::new()), config.chat.clone());

        Self {
            lifecycle: Arc::new(lifecycle),
            fleet: Arc::new(fleet),
            chat: Arc::new(chat),
            events,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
            },
            webhook_secret: config.payments.webhook_secret.clone(),
        }
    }
}
