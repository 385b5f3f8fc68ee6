use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use pmg_api::{
    jwt::{JwtConfig, JwtService},
    routes, sweeper,
    state::AppState,
    uploads::UploadStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending migrations
    run_migrations(&pool, &sqlx::migrate!()).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let uploads = UploadStore::from_env();

    let app_state = AppState::new(pool, jwt_service, uploads);

    // Background task that advances time-driven event statuses
    sweeper::spawn(app_state.event_repository.clone());

    // Start the web server
    let app = routes::create_router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
