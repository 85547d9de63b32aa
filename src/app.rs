use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::db::{CostRepository, PhenologyRepository, ProductionRepository, SupplyRepository};
use crate::services::{
    CostService, PhenologyService, ProductionService, ReportService, SettingsService,
    SupplyService,
};
use crate::settings::SettingsStore;
use crate::weather::WeatherClient;

/// Running HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Wire repositories, services and the optional weather client into
    /// the router, then spawn the server
    pub async fn build(config: Config, pool: SqlitePool) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let state = build_state(&config, pool)?;
        let app = create_router(state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}

/// Shared state for the router. Also used by the integration tests.
pub fn build_state(config: &Config, pool: SqlitePool) -> Result<AppState, Box<dyn std::error::Error>> {
    let production_repo = ProductionRepository::new(pool.clone());
    let supply_repo = SupplyRepository::new(pool.clone());
    let cost_repo = CostRepository::new(pool.clone());
    let phenology_repo = PhenologyRepository::new(pool);

    let settings_service = SettingsService::load(SettingsStore::new(&config.settings_path))?;
    info!("Settings loaded from {}", config.settings_path);

    let weather = weather_client(config);

    Ok(AppState {
        production_service: ProductionService::new(
            production_repo.clone(),
            settings_service.clone(),
            weather.clone(),
        ),
        supply_service: SupplyService::new(supply_repo.clone()),
        cost_service: CostService::new(cost_repo.clone()),
        phenology_service: PhenologyService::new(phenology_repo, settings_service.clone()),
        report_service: ReportService::new(
            production_repo,
            supply_repo,
            cost_repo,
            settings_service.clone(),
        ),
        settings_service,
        weather,
    })
}

fn weather_client(config: &Config) -> Option<WeatherClient> {
    let Some(api_key) = config.weather_api_key.as_deref() else {
        warn!("WEATHER_API_KEY not set, live weather disabled");
        return None;
    };

    match WeatherClient::new(
        config.weather_api_url.as_str(),
        api_key,
        Duration::from_secs(config.weather_timeout_secs),
    ) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Failed to build weather client, live weather disabled: {}", e);
            None
        }
    }
}
