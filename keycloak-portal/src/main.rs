use keycloak_identity::{BootstrapOutcome, ClientBootstrapService, ClientTemplate};
use keycloak_portal::{router, AppState, Config};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "keycloak_portal=debug,keycloak_identity=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let template = ClientTemplate::load(config.keycloak.client_template_path.as_deref())?;
    let state = AppState::new(config)?;

    // Demo convenience: register the OIDC client if the realm lacks it
    let bootstrap = ClientBootstrapService::new(
        state.identity.admin().clone(),
        &state.config.keycloak.client_id,
        &state.config.keycloak.client_secret,
        template,
    );
    if let BootstrapOutcome::Failed { reason } = bootstrap.ensure_client_exists().await {
        warn!("Continuing without a verified OIDC client: {}", reason);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
