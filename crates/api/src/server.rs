//! HTTP server
//!
//! Wires the routes to an in-memory `ShardedStore`, optionally restored from
//! and saved back to a snapshot file.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use docket_storage::ShardedStore;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::routes::{api_routes, AppState};

/// Server for the docket API
pub struct Server {
    config: ServerConfig,
    store: Arc<ShardedStore>,
    state: AppState,
}

impl Server {
    /// Build a server over an empty store
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(ShardedStore::new()))
    }

    /// Build a server over an existing store
    pub fn with_store(config: ServerConfig, store: Arc<ShardedStore>) -> Self {
        let state = AppState::new(store.clone(), config.retry.clone());
        Self {
            config,
            store,
            state,
        }
    }

    /// Build a server, restoring the configured snapshot if it exists
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be loaded.
    pub fn open(config: ServerConfig) -> anyhow::Result<Self> {
        let store = match &config.snapshot_path {
            Some(path) => ShardedStore::open_or_empty(path)
                .with_context(|| format!("loading snapshot '{}'", path.display()))?,
            None => ShardedStore::new(),
        };
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared handler state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Backing store
    pub fn store(&self) -> &Arc<ShardedStore> {
        &self.store
    }

    /// Full router with CORS and request tracing
    pub fn router(&self) -> Router {
        api_routes(self.state.clone())
            .layer(cors_layer(&self.config.cors_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Write the store to the configured snapshot file, if any
    pub fn save_snapshot(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.config.snapshot_path {
            self.store
                .save_to_file(path)
                .with_context(|| format!("writing snapshot '{}'", path.display()))?;
        }
        Ok(())
    }

    /// Serve until Ctrl-C, then save the snapshot
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.config.socket_addr()))?;

        if self.config.seed_on_start {
            self.state.seed().context("writing seed data")?;
        }

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {}", addr))?;
        tracing::info!(
            target: "docket::server",
            %addr,
            shards = self.store.shard_count(),
            keys = self.store.key_count(),
            "Listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        tracing::info!(target: "docket::server", "Shutting down");
        self.save_snapshot()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<_> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "docket::server", %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "docket::server", error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
