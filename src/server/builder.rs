//! ServerBuilder for fluent API to build HTTP servers

use super::host::ServerHost;
use super::router::build_router;
use crate::config::JsonApiConfig;
use crate::core::auth::{AuthProvider, NoAuthProvider};
use crate::core::service::{EntityLoader, EntityStorage};
use crate::storage::InMemoryEntityStore;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Builder for JSON:API servers
///
/// # Example
///
/// ```ignore
/// let store = InMemoryEntityStore::new();
/// let app = ServerBuilder::new()
///     .with_config(JsonApiConfig::from_yaml_file("config/jsonapi.yaml")?)
///     .with_store(store.clone())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: Option<JsonApiConfig>,
    store: Option<(Arc<dyn EntityLoader>, Arc<dyn EntityStorage>)>,
    auth_provider: Arc<dyn AuthProvider>,
    custom_routes: Vec<Router>,
    cors: bool,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            auth_provider: Arc::new(NoAuthProvider),
            custom_routes: Vec::new(),
            cors: false,
        }
    }

    /// Set the configuration (required)
    pub fn with_config(mut self, config: JsonApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a YAML file
    pub fn with_config_file(self, path: &str) -> Result<Self> {
        Ok(self.with_config(JsonApiConfig::from_yaml_file(path)?))
    }

    /// Set the entity store (defaults to an empty in-memory store)
    pub fn with_store<S>(mut self, store: S) -> Self
    where
        S: EntityStorage + 'static,
    {
        let store = Arc::new(store);
        self.store = Some((store.clone(), store));
        self
    }

    /// Set the authentication provider (defaults to anonymous access)
    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Arc::new(provider);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Allow cross-origin requests from any origin
    pub fn with_permissive_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Build the host holding all server state
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let config = self
            .config
            .take()
            .ok_or_else(|| anyhow::anyhow!("Configuration is required. Call .with_config()"))?;

        let (loader, storage) = self.store.take().unwrap_or_else(|| {
            let store = Arc::new(InMemoryEntityStore::new());
            (store.clone() as Arc<dyn EntityLoader>, store as Arc<dyn EntityStorage>)
        });

        ServerHost::from_builder_components(config, loader, storage, self.auth_provider.clone())
    }

    /// Build the final router
    pub fn build(mut self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        tracing::debug!(
            base_path = %host.config.base_path,
            resource_types = host.resource_types.len(),
            "building router"
        );

        let app = build_router(host, std::mem::take(&mut self.custom_routes));
        Ok(if self.cors {
            app.layer(CorsLayer::permissive())
        } else {
            app
        })
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGTERM or SIGINT
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
