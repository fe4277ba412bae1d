//! Application models stored in docket collections
//!
//! Field names are camelCase on the wire and in storage.

use docket_primitives::{CollectionConfig, Identified};
use serde::{Deserialize, Serialize};

/// Entity name of user documents
pub const USER_ENTITY: &str = "user";
/// Index listing all users
pub const USER_INDEX: &str = "users";
/// Entity name of chat board documents
pub const CHAT_ENTITY: &str = "chat";
/// Index listing all chat boards
pub const CHAT_INDEX: &str = "chats";

/// Per-user UI preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Color theme name
    pub theme: String,
    /// Whether notifications are shown
    pub notifications_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            notifications_enabled: true,
        }
    }
}

/// Kind of calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Something to do
    #[default]
    Task,
    /// Scheduled with other people
    Meeting,
    /// A note to self
    Reminder,
}

/// Calendar event owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id, unique within the owning user
    #[serde(default)]
    pub id: String,
    /// Title, required
    #[serde(default)]
    pub title: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Event kind
    #[serde(rename = "type", default)]
    pub kind: EventType,
    /// Start date as sent by the client (ISO-8601)
    #[serde(default)]
    pub start_date: String,
}

/// A user and their events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
    /// Events in insertion order
    #[serde(default)]
    pub events: Vec<Event>,
    /// UI preferences
    #[serde(default)]
    pub preferences: Preferences,
}

impl User {
    /// Fresh user with no events and default preferences
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            events: Vec::new(),
            preferences: Preferences::default(),
        }
    }
}

impl Default for User {
    fn default() -> Self {
        User::new("", "Anonymous")
    }
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message id
    pub id: String,
    /// Board the message belongs to
    pub chat_id: String,
    /// Author
    pub user_id: String,
    /// Message body
    pub text: String,
    /// Epoch milliseconds
    pub ts: i64,
}

/// A chat board and its messages
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBoard {
    /// Board id
    pub id: String,
    /// Board title
    pub title: String,
    /// Messages in send order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Identified for ChatBoard {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

/// Boards written on first listing of an empty chat index
pub fn seed_chat_boards() -> Vec<ChatBoard> {
    let ts = chrono::Utc::now().timestamp_millis();
    vec![ChatBoard {
        id: "c1".to_string(),
        title: "General".to_string(),
        messages: vec![ChatMessage {
            id: "m1".to_string(),
            chat_id: "c1".to_string(),
            user_id: "u1".to_string(),
            text: "Hello".to_string(),
            ts,
        }],
    }]
}

/// Collection configuration for users
pub fn user_collection() -> CollectionConfig<User> {
    CollectionConfig::new(USER_ENTITY, USER_INDEX, User::default())
}

/// Collection configuration for chat boards, with seed data
pub fn chat_collection() -> CollectionConfig<ChatBoard> {
    CollectionConfig::new(CHAT_ENTITY, CHAT_INDEX, ChatBoard::default())
        .with_seed(seed_chat_boards())
}
