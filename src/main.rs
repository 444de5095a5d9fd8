use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tourdesk::config::AppConfig;
use tourdesk::db;
use tourdesk::handlers;
use tourdesk::services::notify::email::EmailApiNotifier;
use tourdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.email_api_key.is_empty() {
        tracing::warn!("EMAIL_API_KEY not set, booking confirmations will fail until configured");
    }
    let notifier = EmailApiNotifier::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Arc::new(notifier),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::lookup_bookings))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id", put(handlers::bookings::update_booking))
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::delete_booking),
        )
        .route("/api/tours", get(handlers::tours::list_tours))
        .route("/api/tours/:id", get(handlers::tours::get_tour))
        .route(
            "/api/admin/dashboard",
            get(handlers::dashboard::get_dashboard),
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
