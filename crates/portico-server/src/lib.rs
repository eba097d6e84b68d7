//! HTTP server assembly: routes, middleware stack, and graceful shutdown

mod auth;
mod client_ip;
mod health;
mod rate_limit;
mod request_context;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use portico_config::Config;
use portico_gateway::GatewayState;
use portico_ratelimit::RequestLimiter;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if gateway state or rate-limiter construction fails
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let limiter = config
            .server
            .rate_limit
            .as_ref()
            .map(|rl| RequestLimiter::new(rl).map(Arc::new))
            .transpose()?;

        let state = GatewayState::new(config, limiter.clone())?;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler).with_state(state.clone()),
            );
        }

        // Completions
        app = app.merge(portico_gateway::gateway_router(state));

        // Apply middleware layers (innermost first)

        // Request context runs just before handlers
        app = app.layer(axum::middleware::from_fn(request_context::request_context_middleware));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // API key authentication
        if let Some(ref auth_config) = config.server.auth
            && auth_config.enabled
        {
            let auth_config = Arc::new(auth_config.clone());
            let auth_limiter = limiter.clone();
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let config = Arc::clone(&auth_config);
                let limiter = auth_limiter.clone();
                async move { auth::auth_middleware(config, limiter, req, next).await }
            }));
        }

        // Rate limiting
        if let Some(limiter) = limiter {
            let health_path: Arc<str> = Arc::from(config.server.health.path.as_str());
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let limiter = Arc::clone(&limiter);
                let health_path = Arc::clone(&health_path);
                async move { rate_limit::rate_limit_middleware(limiter, health_path, req, next).await }
            }));
        }

        // Client IP resolution (outermost; everything below reads the extension)
        let client_ip_config = config.server.client_ip.clone();
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let config = client_ip_config.clone();
            async move { client_ip::client_ip_middleware(config, req, next).await }
        }));

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}
