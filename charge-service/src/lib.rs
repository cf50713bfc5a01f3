pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, patch, post},
    Router,
};
use charge_core::auth::AuthGateway;
use charge_core::middleware::error_path::error_path_middleware;
use charge_core::middleware::tracing::request_id_middleware;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{ChargeRepository, ChargeService, MockProvider};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: Arc<dyn AuthGateway>,
    pub charges: ChargeService,
}

pub struct Application {
    port: u16,
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Application {
    /// Connect, migrate, and assemble the router. The listener is bound here
    /// so callers binding port 0 can read the assigned port back.
    pub async fn build(config: Config, auth: Arc<dyn AuthGateway>) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config.database).await?;
        db::run_migrations(&pool).await?;

        services::metrics::init_metrics();

        let repository = ChargeRepository::new(pool.clone());
        let charges = ChargeService::new(repository, Arc::new(MockProvider));

        let state = AppState {
            pool,
            auth,
            charges,
        };

        let public = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics_handler))
            .route("/users/register", post(handlers::users::register))
            .route("/users/login", post(handlers::users::login));

        let protected = Router::new()
            .route(
                "/charges",
                post(handlers::charges::create_charge).get(handlers::charges::list_charges),
            )
            .route("/charges/:id", get(handlers::charges::get_charge))
            .route(
                "/charges/:id/status",
                patch(handlers::charges::update_charge_status),
            )
            .route("/users/logout", post(handlers::users::logout))
            .route(
                "/users",
                post(handlers::users::create_user).get(handlers::users::list_users),
            )
            .route(
                "/users/:id",
                patch(handlers::users::update_user).delete(handlers::users::delete_user),
            )
            .layer(from_fn_with_state(
                state.clone(),
                middleware::auth_middleware,
            ));

        let router = Router::new()
            .merge(public)
            .merge(protected)
            .layer(from_fn(error_path_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    // request_id is recorded by request_id_middleware.
                    tracing::info_span!(
                        "http_request",
                        request_id = tracing::field::Empty,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
