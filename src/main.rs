use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use farm_tracker_service::app::Application;
use farm_tracker_service::config::Config;
use farm_tracker_service::db::DbPool;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,farm_tracker_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!(
        "Starting farm tracker service on {} (settings: {}, live weather: {})",
        config.server_addr(),
        config.settings_path,
        config.weather_api_key.is_some()
    );

    info!("Connecting to database...");
    let pool = DbPool::connect(&config.database_url, 5).await?;
    info!("Database connection established");

    let app = Application::build(config, pool.into_inner()).await?;
    app.run_until_stopped().await
}
