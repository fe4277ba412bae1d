//! Model-specific entity operations
//!
//! Each operation is a single `mutate` (or read) on one entity handle, so it
//! inherits the handle's CAS retry.

use crate::model::{ChatBoard, ChatMessage, Event, User};
use docket_core::{Error, Result};
use docket_primitives::{merge_fields, Entity};
use serde_json::{Map, Value};

/// Event editing on a user entity
pub trait UserEvents {
    /// Append `event` to the user's events
    fn add_event(&mut self, event: Event) -> Result<User>;

    /// Shallow-merge `updates` into the event with id `event_id`.
    ///
    /// The event id itself cannot be changed. Fails with `NotFound` when the
    /// user has no such event.
    fn update_event(&mut self, event_id: &str, updates: &Map<String, Value>) -> Result<User>;

    /// Drop the event with id `event_id`, if present
    fn delete_event(&mut self, event_id: &str) -> Result<User>;
}

impl UserEvents for Entity<User> {
    fn add_event(&mut self, event: Event) -> Result<User> {
        self.mutate(|user| {
            let mut next = user.clone();
            next.events.push(event.clone());
            next
        })
    }

    fn update_event(&mut self, event_id: &str, updates: &Map<String, Value>) -> Result<User> {
        self.try_mutate(|user| {
            let mut next = user.clone();
            let event = next
                .events
                .iter_mut()
                .find(|e| e.id == event_id)
                .ok_or_else(|| Error::not_found("Event not found"))?;
            let mut merged = merge_fields(&*event, updates)?;
            merged.id = event_id.to_string();
            *event = merged;
            Ok(next)
        })
    }

    fn delete_event(&mut self, event_id: &str) -> Result<User> {
        self.mutate(|user| {
            let mut next = user.clone();
            next.events.retain(|e| e.id != event_id);
            next
        })
    }
}

/// Messaging on a chat board entity
pub trait ChatMessages {
    /// Messages currently on the board
    fn list_messages(&mut self) -> Result<Vec<ChatMessage>>;

    /// Append a new message and return it
    fn send_message(&mut self, user_id: &str, text: &str) -> Result<ChatMessage>;
}

impl ChatMessages for Entity<ChatBoard> {
    fn list_messages(&mut self) -> Result<Vec<ChatMessage>> {
        Ok(self.state()?.messages)
    }

    fn send_message(&mut self, user_id: &str, text: &str) -> Result<ChatMessage> {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: self.id().to_string(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            ts: chrono::Utc::now().timestamp_millis(),
        };
        self.mutate(|board| {
            let mut next = board.clone();
            next.messages.push(message.clone());
            next
        })?;
        Ok(message)
    }
}
