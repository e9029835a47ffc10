use std::net::{IpAddr, SocketAddr};

use sea_orm::SqlxPostgresConnector;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bakery_admin_api::{
    app::build_app,
    config::AppConfig,
    db::{create_pool, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bakery_admin_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());

    run_migrations(&orm).await?;
    tracing::info!("migrations applied");

    let state = AppState::new(pool, orm, config.jwt_secret.clone(), config.jwt_ttl_hours);
    let app = build_app(state, &config.cors_origins);

    let addr = SocketAddr::from((config.host.parse::<IpAddr>()?, config.port));
    tracing::info!(%addr, "bakery admin api listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
