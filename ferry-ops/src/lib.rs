pub mod chat;
pub mod lifecycle;
pub mod queries;
pub mod receipt;

pub use chat::{ChatLog, InboxFilter, SentMessage};
pub use lifecycle::LifecycleService;
pub use queries::BookingFilter;
pub use receipt::Receipt;

#[cfg(test)]
mod tests_support;
