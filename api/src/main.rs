use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_actix_web::TracingLogger;

use pv_api::middleware::cors::create_cors;
use pv_api::{create_app, telemetry, AppState};
use pv_core::services::verification::{
    Clock, SystemClock, VerificationService, VerificationServiceConfig,
};
use pv_infra::{build_code_store, create_sms_gateway};
use pv_shared::config::{AppConfig, Environment};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();
    dotenvy::from_filename(environment.env_file()).ok();
    dotenvy::dotenv().ok();

    let config = AppConfig::load_for(environment).context("failed to load configuration")?;
    telemetry::init(&config.logging).context("failed to initialize logging")?;

    info!(
        environment = %config.environment,
        store = ?config.store.backend,
        sms_provider = ?config.sms.provider,
        "Starting phone verification API"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_code_store(&config.store, &config.verification, clock.clone())
        .await
        .context("failed to build verification store")?;
    let sweeper_task = store
        .sweeper
        .clone()
        .and_then(|sweeper| sweeper.start_background_task());

    let gateway = create_sms_gateway(&config.sms).context("failed to build SMS gateway")?;

    let service = VerificationService::new(
        gateway,
        store.store,
        VerificationServiceConfig::from(&config.verification),
    )
    .with_clock(clock);

    let state = web::Data::new(AppState::new(Arc::new(service), config.environment));
    let server_config = config.server.clone();
    let bind_address = config.server.bind_address();

    info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || {
        create_app(state.clone())
            .wrap(create_cors(&server_config, environment))
            .wrap(TracingLogger::default())
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    if let Some(task) = sweeper_task {
        task.abort();
    }
    info!("Server stopped");

    Ok(())
}
