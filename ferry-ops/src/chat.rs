//! Passenger support chat with the operations desk.

use ferry_core::chat::{ChatMessage, InboxEntry, NewChatMessage, Sender};
use ferry_core::repository::ChatRepository;
use ferry_core::{Actor, CoreError, CoreResult};
use ferry_store::app_config::ChatConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DESK_NAME: &str = "Operation Staff";

/// A stored passenger message and the acknowledgement sent back, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub message: ChatMessage,
    pub auto_reply: Option<ChatMessage>,
}

/// Narrows the staff views to one desk, e.g. `service` or `operation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxFilter {
    #[serde(default)]
    pub category: Option<String>,
}

impl InboxFilter {
    pub fn for_desk(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
        }
    }

    fn admits(&self, message: &ChatMessage) -> bool {
        match optional(&self.category) {
            Some(category) => message.category == category,
            None => true,
        }
    }
}

pub struct ChatLog {
    messages: Arc<dyn ChatRepository>,
    settings: ChatConfig,
}

fn non_blank(field: &str, value: &str) -> CoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "must not be blank"));
    }
    Ok(value.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ChatLog {
    pub fn new(messages: Arc<dyn ChatRepository>, settings: ChatConfig) -> Self {
        Self { messages, settings }
    }

    pub async fn send_passenger_message(
        &self,
        actor: &Actor,
        input: &NewChatMessage,
    ) -> CoreResult<SentMessage> {
        actor.require_passenger("message the operations desk")?;
        let body = non_blank("body", &input.body)?;
        let name = optional(&input.author_name).unwrap_or_else(|| "Passenger".to_string());
        let category =
            optional(&input.category).unwrap_or_else(|| self.settings.default_category.clone());

        let message = ChatMessage::new(actor.id, Sender::Passenger, name.clone(), category.clone(), body)
            .with_email(optional(&input.author_email));
        self.messages.append(&message).await?;
        info!("Passenger {} wrote to the {} desk", actor.id, category);

        let auto_reply = if self.settings.auto_reply {
            let reply = ChatMessage::new(
                actor.id,
                Sender::System,
                DESK_NAME,
                category.clone(),
                format!(
                    "Hello {}, your message has been received. Our {} team will respond shortly.",
                    name, category
                ),
            );
            self.messages.append(&reply).await?;
            Some(reply)
        } else {
            None
        };

        Ok(SentMessage { message, auto_reply })
    }

    /// Fails with `NotFound` when the passenger has never written in.
    pub async fn staff_reply(&self, actor: &Actor, passenger_id: Uuid, body: &str) -> CoreResult<ChatMessage> {
        actor.require_elevated("reply to passengers")?;
        let body = non_blank("body", body)?;

        let thread = self.messages.conversation(passenger_id).await?;
        let latest = thread
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Passenger)
            .ok_or_else(|| CoreError::not_found("conversation", passenger_id))?;

        let reply = ChatMessage::new(passenger_id, Sender::Staff, DESK_NAME, latest.category.clone(), body);
        self.messages.append(&reply).await?;
        info!("{} {} replied to passenger {}", actor.role, actor.id, passenger_id);
        Ok(reply)
    }

    /// Oldest first.
    pub async fn conversation(&self, actor: &Actor, passenger_id: Uuid) -> CoreResult<Vec<ChatMessage>> {
        actor.require_owner_or_elevated(passenger_id, "read this conversation")?;
        Ok(self.messages.conversation(passenger_id).await?)
    }

    /// One row per passenger who has written to the desk, most recent first.
    pub async fn inbox(&self, actor: &Actor, filter: &InboxFilter) -> CoreResult<Vec<InboxEntry>> {
        actor.require_elevated("read the support inbox")?;

        let mut threads: HashMap<Uuid, Vec<ChatMessage>> = HashMap::new();
        for message in self.messages.all().await? {
            if filter.admits(&message) {
                threads.entry(message.passenger_id).or_default().push(message);
            }
        }

        let mut inbox: Vec<InboxEntry> = threads
            .into_iter()
            .filter_map(|(passenger_id, thread)| {
                let last = thread.iter().rposition(|m| m.sender == Sender::Passenger)?;
                let from_passenger = thread.iter().filter(|m| m.sender == Sender::Passenger);
                Some(InboxEntry {
                    passenger_id,
                    total_messages: from_passenger.clone().count(),
                    unread: from_passenger.filter(|m| !m.read).count(),
                    responded: thread[last + 1..].iter().any(|m| m.sender == Sender::Staff),
                    latest: thread[last].clone(),
                })
            })
            .collect();

        inbox.sort_by(|a, b| b.latest.sent_at.cmp(&a.latest.sent_at));
        Ok(inbox)
    }

    /// Passenger messages the desk has not read yet.
    pub async fn unread_count(&self, actor: &Actor, filter: &InboxFilter) -> CoreResult<usize> {
        actor.require_elevated("read the support inbox")?;
        let unread = self
            .messages
            .all()
            .await?
            .iter()
            .filter(|m| m.sender == Sender::Passenger && !m.read && filter.admits(m))
            .count();
        Ok(unread)
    }

    pub async fn mark_read(&self, actor: &Actor, passenger_id: Uuid) -> CoreResult<usize> {
        actor.require_elevated("mark messages read")?;
        let changed = self.messages.mark_read(passenger_id).await?;
        info!("Marked {} message(s) from passenger {} read", changed, passenger_id);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_store::MemoryChatRepository;

    fn chat_log(auto_reply: bool) -> ChatLog {
        let settings = ChatConfig {
            auto_reply,
            ..Default::default()
        };
        ChatLog::new(Arc::new(MemoryChatRepository::new()), settings)
    }

    fn note(body: &str) -> NewChatMessage {
        NewChatMessage {
            author_name: Some("Amina".to_string()),
            author_email: Some("amina@example.com".to_string()),
            category: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_auto_reply_acknowledges_message() {
        let log = chat_log(true);
        let passenger = Actor::passenger(Uuid::new_v4());

        let sent = log.send_passenger_message(&passenger, &note("Is the 8:30 running?")).await.unwrap();
        assert_eq!(sent.message.category, "operation");
        let reply = sent.auto_reply.unwrap();
        assert_eq!(
            reply.body,
            "Hello Amina, your message has been received. Our operation team will respond shortly."
        );
        assert_eq!(log.conversation(&passenger, passenger.id).await.unwrap().len(), 2);

        let blank = log.send_passenger_message(&passenger, &note("   ")).await.unwrap_err();
        assert!(matches!(blank, CoreError::Validation(ref e) if e.field == "body"));
    }

    #[tokio::test]
    async fn test_staff_reply_needs_existing_thread() {
        let log = chat_log(false);
        let staff = Actor::staff(Uuid::new_v4());
        let passenger = Actor::passenger(Uuid::new_v4());

        assert!(matches!(
            log.staff_reply(&staff, passenger.id, "Hello").await,
            Err(CoreError::NotFound { .. })
        ));

        log.send_passenger_message(&passenger, &note("Help")).await.unwrap();
        let reply = log.staff_reply(&staff, passenger.id, "On it").await.unwrap();
        assert_eq!(reply.sender, Sender::Staff);
        assert_eq!(reply.passenger_id, passenger.id);

        assert!(matches!(
            log.staff_reply(&passenger, passenger.id, "Hi me").await,
            Err(CoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_inbox_tracks_replies_and_unread() {
        let log = chat_log(true);
        let staff = Actor::staff(Uuid::new_v4());
        let first = Actor::passenger(Uuid::new_v4());
        let second = Actor::passenger(Uuid::new_v4());

        log.send_passenger_message(&first, &note("One")).await.unwrap();
        log.send_passenger_message(&first, &note("Two")).await.unwrap();
        log.send_passenger_message(&second, &note("Three")).await.unwrap();
        log.staff_reply(&staff, second.id, "Answered").await.unwrap();

        let inbox = log.inbox(&staff, &InboxFilter::default()).await.unwrap();
        assert_eq!(inbox.len(), 2);
        let row = |id: Uuid| inbox.iter().find(|e| e.passenger_id == id).unwrap();

        assert_eq!(row(first.id).total_messages, 2);
        assert_eq!(row(first.id).unread, 2);
        assert_eq!(row(first.id).latest.body, "Two");
        assert!(!row(first.id).responded);
        assert!(row(second.id).responded);

        assert_eq!(log.mark_read(&staff, first.id).await.unwrap(), 2);
        let inbox = log.inbox(&staff, &InboxFilter::default()).await.unwrap();
        assert_eq!(inbox.iter().find(|e| e.passenger_id == first.id).unwrap().unread, 0);

        assert!(matches!(log.inbox(&first, &InboxFilter::default()).await, Err(CoreError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_conversation_is_private() {
        let log = chat_log(false);
        let owner = Actor::passenger(Uuid::new_v4());
        let other = Actor::passenger(Uuid::new_v4());
        log.send_passenger_message(&owner, &note("Private")).await.unwrap();

        assert!(matches!(
            log.conversation(&other, owner.id).await,
            Err(CoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_desks_see_only_their_own_messages() {
        let log = chat_log(true);
        let staff = Actor::staff(Uuid::new_v4());
        let first = Actor::passenger(Uuid::new_v4());
        let second = Actor::passenger(Uuid::new_v4());

        let to_service = NewChatMessage {
            category: Some("service".to_string()),
            ..note("Lost luggage")
        };
        log.send_passenger_message(&first, &to_service).await.unwrap();
        log.send_passenger_message(&first, &to_service).await.unwrap();
        log.send_passenger_message(&second, &note("Delays?")).await.unwrap();

        let service = InboxFilter::for_desk("service");
        let inbox = log.inbox(&staff, &service).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].passenger_id, first.id);
        assert_eq!(inbox[0].latest.category, "service");

        assert_eq!(log.unread_count(&staff, &service).await.unwrap(), 2);
        assert_eq!(log.unread_count(&staff, &InboxFilter::for_desk("operation")).await.unwrap(), 1);
        // auto-replies are not counted
        assert_eq!(log.unread_count(&staff, &InboxFilter::default()).await.unwrap(), 3);

        log.mark_read(&staff, first.id).await.unwrap();
        assert_eq!(log.unread_count(&staff, &service).await.unwrap(), 0);

        assert!(matches!(
            log.unread_count(&first, &service).await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
