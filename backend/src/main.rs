//! Backend entry-point: loads settings, wires services and serves the API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use quality_backend::inbound::http::health::HealthState;
use server::{ServerSettings, build_app_services, create_server, initial_refresh};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings.bind_addr()?;
    let services = build_app_services(&settings)?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        services.http_state.clone(),
        bind_addr,
    )?;
    info!(%bind_addr, "listening");

    let ready_state = health_state.clone();
    actix_web::rt::spawn(async move {
        initial_refresh(&services).await;
        ready_state.mark_ready();
    });

    let result = server.await;
    health_state.mark_unhealthy();
    result
}
