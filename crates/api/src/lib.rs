//! Request-handling layer for docket
//!
//! This crate is the HTTP face of the document store:
//! - **Models**: users with events, chat boards with messages
//! - **Routes**: one handler per operation, answering with the
//!   `{success, data?, error?}` envelope
//! - **Server**: axum server with CORS, request tracing, and snapshot
//!   persistence across restarts
//!
//! ## Architectural Invariant
//!
//! Every handler performs exactly one core operation (plus an existence
//! check where a 404 is required). Validation happens before the store is
//! touched.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docket_api::{Server, ServerConfig};
//!
//! let server = Server::open(ServerConfig::default())?;
//! server.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod model;
pub mod ops;
pub mod response;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ServerConfig, CONFIG_FILE_NAME};
pub use model::{
    chat_collection, seed_chat_boards, user_collection, ChatBoard, ChatMessage, Event, EventType,
    Preferences, User,
};
pub use ops::{ChatMessages, UserEvents};
pub use response::{ApiError, ApiResponse, ApiResult};
pub use routes::{api_routes, AppState};
pub use server::Server;
