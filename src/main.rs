use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use eventhyra::config::AppConfig;
use eventhyra::db;
use eventhyra::handlers;
use eventhyra::services::auth::hosted::HostedAuthProvider;
use eventhyra::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.auth_service_key.is_empty() {
        tracing::warn!("AUTH_SERVICE_KEY not set, user administration will fail against the hosted auth service");
    }
    let auth = HostedAuthProvider::new(config.auth_url.clone(), config.auth_service_key.clone());

    let (comments_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        auth: Box::new(auth),
        comments_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/roles", get(handlers::admin::list_roles))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/create-user", post(handlers::admin::create_user))
        .route(
            "/api/admin/reset-password",
            post(handlers::admin::reset_password),
        )
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings/range", get(handlers::bookings::booking_range))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/status",
            post(handlers::bookings::update_status),
        )
        .route(
            "/api/bookings/:id/comments",
            get(handlers::comments::get_comments).post(handlers::comments::post_comment),
        )
        .route("/api/comments/events", get(handlers::comments::events_stream))
        .route(
            "/api/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/api/customers/:id", get(handlers::customers::get_customer))
        .route("/portal/:token", get(handlers::portal::portal_booking))
        .route(
            "/portal/:token/comments",
            post(handlers::portal::portal_post_comment),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
