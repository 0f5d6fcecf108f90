use crate::config::AppConfig;
use crate::handlers::{health, receivables};
use crate::middleware::auth;
use crate::services::auth_client::UserDirectory;
use crate::services::documents::DocumentStorage;
use crate::services::jwt::JwtValidator;
use crate::services::receivable::ReceivableService;
use crate::services::store::ReceivableStore;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub service: ReceivableService,
    pub jwt: JwtValidator,
    pub users: Arc<dyn UserDirectory>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(
        config: &AppConfig,
        store: Arc<dyn ReceivableStore>,
        documents: Arc<dyn DocumentStorage>,
        users: Arc<dyn UserDirectory>,
    ) -> Result<Self, AppError> {
        let jwt = JwtValidator::new(&config.jwt.secret)?;

        let state = AppState {
            service: ReceivableService::new(store, documents),
            jwt,
            users,
        };

        let app = Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route(
                "/receivables",
                get(receivables::list_receivables).post(receivables::create_receivable),
            )
            .route("/receivables/overdue", get(receivables::list_overdue_receivables))
            .route(
                "/receivables/summary/pending-amount",
                get(receivables::total_pending_amount),
            )
            .route(
                "/receivables/summary/overdue-amount",
                get(receivables::total_overdue_amount),
            )
            .route(
                "/receivables/:id",
                get(receivables::get_receivable)
                    .put(receivables::update_receivable)
                    .delete(receivables::delete_receivable),
            )
            .route(
                "/receivables/:id/status",
                patch(receivables::patch_receivable_status),
            )
            .route(
                "/receivables/:id/documents",
                post(receivables::upload_document).get(receivables::list_documents),
            )
            .route(
                "/receivables/:id/documents/:reference",
                axum::routing::delete(receivables::delete_document),
            )
            .layer(from_fn_with_state(state.clone(), auth::authenticate))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = SocketAddr::new(config.server.host.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid server host: {}", e))
        })?, config.server.port);
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
