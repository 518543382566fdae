//! AsthmaCare patient record API
//!
//! Main entry point for the AsthmaCare API server.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use asthmacare::{api, config, db, notify, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    // Load configuration
    let config = config::load_config().context("failed to load configuration")?;

    // Connect to database and apply schema
    let database = db::Database::connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    // SMS dispatch is fire-and-forget; the log notifier stands in for a
    // real gateway integration.
    let app_state = web::Data::new(AppState {
        db: database,
        notifier: Arc::new(notify::SmsLogNotifier),
    });

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("starting AsthmaCare API on {}", bind_addr);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(api::json_config())
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .configure(api::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
