//! HTTP routes for users, events and chat boards
//!
//! Each handler builds entity handles for the ids in the path and performs
//! one collection or entity operation. Store calls are synchronous, so they
//! run on the blocking pool.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Router,
};
use docket_core::{KeyValueStore, Page};
use docket_primitives::{Collection, RetryConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{chat_collection, user_collection, ChatBoard, ChatMessage, Event, User};
use crate::ops::{ChatMessages, UserEvents};
use crate::response::{ok, ApiError, ApiResult};

// ==================
// Shared State
// ==================

/// Collections shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Users and their events
    pub users: Collection<User>,
    /// Chat boards and their messages
    pub chats: Collection<ChatBoard>,
}

impl AppState {
    /// Bind the app collections to `kv`
    pub fn new(kv: Arc<dyn KeyValueStore>, retry: RetryConfig) -> Self {
        Self {
            users: Collection::new(Arc::clone(&kv), user_collection().with_retry(retry.clone())),
            chats: Collection::new(kv, chat_collection().with_retry(retry)),
        }
    }

    /// Write seed data for every collection that has an empty index
    pub fn seed(&self) -> docket_core::Result<()> {
        self.users.ensure_seed()?;
        self.chats.ensure_seed()?;
        Ok(())
    }
}

// ==================
// Request/Response Types
// ==================

/// Paging query string
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Raw cursor from a previous page
    pub cursor: Option<String>,
    /// Page size
    pub limit: Option<String>,
}

impl ListQuery {
    fn limit(&self) -> Result<Option<usize>, ApiError> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ApiError::bad_request("limit must be a non-negative integer")),
        }
    }

    fn cursor(&self) -> Option<String> {
        self.cursor.clone().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateUserRequest {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteManyRequest {
    ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CreateChatRequest {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    user_id: Option<String>,
    text: Option<String>,
}

/// Body of a single delete
#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    /// Whether the document existed
    pub deleted: bool,
}

/// Body of a bulk delete
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCount {
    /// Number of documents that existed
    pub deleted_count: usize,
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    /// Always "ok"
    pub status: String,
}

// ==================
// Routes
// ==================

/// Create the API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Users
        .route("/api/users", get(list_users_handler).post(create_user_handler))
        .route("/api/users/deleteMany", post(delete_many_users_handler))
        .route(
            "/api/users/:id",
            get(get_user_handler)
                .patch(patch_user_handler)
                .delete(delete_user_handler),
        )
        // Events
        .route("/api/users/:id/events", post(add_event_handler))
        .route(
            "/api/users/:id/events/:event_id",
            patch(update_event_handler).delete(delete_event_handler),
        )
        // Chats
        .route("/api/chats", get(list_chats_handler).post(create_chat_handler))
        .route(
            "/api/chats/:chat_id/messages",
            get(list_messages_handler).post(send_message_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Run a store call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("request task failed: {}", e)))?
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

fn parse_object(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    match parse_body::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Body must be a JSON object")),
    }
}

/// Trimmed, non-empty string or `None`
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn require_user(state: &AppState, id: &str) -> Result<docket_primitives::Entity<User>, ApiError> {
    let user = state.users.entity(id);
    if !user.exists()? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(user)
}

fn require_chat(
    state: &AppState,
    id: &str,
) -> Result<docket_primitives::Entity<ChatBoard>, ApiError> {
    let chat = state.chats.entity(id);
    if !chat.exists()? {
        return Err(ApiError::not_found("chat not found"));
    }
    Ok(chat)
}

// ==================
// Handlers
// ==================

async fn health_handler() -> ApiResult<Health> {
    ok(Health {
        status: "ok".to_string(),
    })
}

async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<User>> {
    let limit = query.limit()?;
    let cursor = query.cursor();
    let page = blocking(move || Ok(state.users.list(cursor.as_deref(), limit)?)).await?;
    ok(page)
}

async fn create_user_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<User> {
    let request: CreateUserRequest = if body.is_empty() {
        CreateUserRequest::default()
    } else {
        parse_body(&body)?
    };
    let id = non_blank(request.id).unwrap_or_else(new_id);
    let name = non_blank(request.name).unwrap_or_else(|| "New User".to_string());

    let user = blocking(move || Ok(state.users.create(User::new(id, name))?)).await?;
    tracing::info!(target: "docket::api", id = %user.id, "User created");
    ok(user)
}

async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let user = blocking(move || {
        state
            .users
            .get(&id)?
            .ok_or_else(|| ApiError::not_found("User not found"))
    })
    .await?;
    ok(user)
}

async fn patch_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<User> {
    let updates = parse_object(&body)?;
    let user = blocking(move || {
        let mut user = require_user(&state, &id)?;
        Ok(user.patch(updates)?)
    })
    .await?;
    ok(user)
}

async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted = blocking(move || Ok(state.users.delete(&id)?)).await?;
    ok(Deleted { deleted })
}

async fn delete_many_users_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<DeletedCount> {
    let request: DeleteManyRequest = parse_body(&body)?;
    let ids = request
        .ids
        .ok_or_else(|| ApiError::bad_request("ids required"))?;
    let deleted_count = blocking(move || Ok(state.users.delete_many(&ids)?)).await?;
    ok(DeletedCount { deleted_count })
}

async fn add_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<User> {
    let mut event: Event = parse_body(&body)?;
    if event.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title required"));
    }
    event.id = new_id();

    let user = blocking(move || {
        let mut user = require_user(&state, &id)?;
        Ok(user.add_event(event)?)
    })
    .await?;
    ok(user)
}

async fn update_event_handler(
    State(state): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<User> {
    let updates = parse_object(&body)?;
    let user = blocking(move || {
        let mut user = require_user(&state, &id)?;
        Ok(user.update_event(&event_id, &updates)?)
    })
    .await?;
    ok(user)
}

async fn delete_event_handler(
    State(state): State<AppState>,
    Path((id, event_id)): Path<(String, String)>,
) -> ApiResult<User> {
    let user = blocking(move || {
        let mut user = require_user(&state, &id)?;
        Ok(user.delete_event(&event_id)?)
    })
    .await?;
    ok(user)
}

async fn list_chats_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<ChatBoard>> {
    let limit = query.limit()?;
    let cursor = query.cursor();
    let page = blocking(move || {
        state.chats.ensure_seed()?;
        Ok(state.chats.list(cursor.as_deref(), limit)?)
    })
    .await?;
    ok(page)
}

async fn create_chat_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<ChatBoard> {
    let request: CreateChatRequest = parse_body(&body)?;
    let title = non_blank(request.title).ok_or_else(|| ApiError::bad_request("title required"))?;
    let board = ChatBoard {
        id: new_id(),
        title,
        messages: Vec::new(),
    };
    let board = blocking(move || Ok(state.chats.create(board)?)).await?;
    ok(board)
}

async fn list_messages_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Vec<ChatMessage>> {
    let messages = blocking(move || {
        let mut chat = require_chat(&state, &chat_id)?;
        Ok(chat.list_messages()?)
    })
    .await?;
    ok(messages)
}

async fn send_message_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    body: Bytes,
) -> ApiResult<ChatMessage> {
    let request: SendMessageRequest = parse_body(&body)?;
    let (user_id, text) = match (non_blank(request.user_id), non_blank(request.text)) {
        (Some(user_id), Some(text)) => (user_id, text),
        _ => return Err(ApiError::bad_request("userId and text required")),
    };
    let message = blocking(move || {
        let mut chat = require_chat(&state, &chat_id)?;
        Ok(chat.send_message(&user_id, &text)?)
    })
    .await?;
    ok(message)
}
