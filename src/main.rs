use std::net::SocketAddr;
use std::time::Duration;

use quiz_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    repositories::Repositories,
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    init_config()?;
    let config = get_config()?;

    let pool = create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied");

    let app_state = AppState::new(config.clone(), Repositories::postgres(pool));

    if let Some(seed) = &config.admin_seed {
        match app_state.auth_service.seed_admin(seed).await {
            Ok(true) => info!(email = %seed.email, "Admin account created"),
            Ok(false) => info!(email = %seed.email, "Admin account already present"),
            Err(e) => tracing::error!(error = ?e, "Admin seeding failed"),
        }
    }

    if let Some(minutes) = config.abandon_after_minutes {
        let attempts = app_state.attempt_service.clone();
        let max_age = chrono::Duration::minutes(minutes);
        info!(minutes, "Abandoned-attempt sweep enabled");
        tokio::spawn(async move {
            loop {
                if let Err(e) = attempts.abandon_stale(max_age).await {
                    tracing::error!(error = ?e, "Abandoned-attempt sweep failed");
                }
                tokio::time::sleep(SWEEP_INTERVAL).await;
            }
        });
    }

    let app = routes::create_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
