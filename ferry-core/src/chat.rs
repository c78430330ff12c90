use chrono::{DateTime, Utc};
use ferry_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Passenger,
    Staff,
    System,
}

/// One line of a passenger's conversation with the operations desk.
/// `passenger_id` keys the whole thread, staff replies included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub author_name: String,
    pub author_email: Option<Masked<String>>,
    pub category: String,
    pub sender: Sender,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl ChatMessage {
    pub fn new(
        passenger_id: Uuid,
        sender: Sender,
        author_name: impl Into<String>,
        category: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            passenger_id,
            author_name: author_name.into(),
            author_email: None,
            category: category.into(),
            sender,
            body: body.into(),
            sent_at: Utc::now(),
            read: false,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.author_email = email.map(Masked);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChatMessage {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub body: String,
}

/// Staff dashboard row: a passenger's latest message and thread stats.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InboxEntry {
    pub passenger_id: Uuid,
    pub latest: ChatMessage,
    pub total_messages: usize,
    pub unread: usize,
    pub responded: bool,
}
