use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::agronomy::{
    self, Advisory, CropProfile, ExpectedYield, FertilizationDose, SanitaryAlert,
    SpaceOptimization,
};
use crate::analytics::{AnalysisReport, ReportFilter, SupplyHistory};
use crate::db::{
    CostRecord, ImportSummary, NewCostRecord, NewProductionRecord, NewSupplyRecord,
    ProductionRecord, SpeciesPhenology, SupplyRecord,
};
use crate::importers::{ExcelImporter, SheetTable};
use crate::phenology::Stage;
use crate::services::phenology_service::{DoseLookup, StageLookup};
use crate::services::report_service::Dashboard;
use crate::services::{
    CostService, PhenologyService, ProductionService, ReportService, ServiceError,
    SettingsService, SupplyService,
};
use crate::settings::Settings;
use crate::weather::{WeatherClient, WeatherReport};

#[derive(Clone)]
pub struct AppState {
    pub production_service: ProductionService,
    pub supply_service: SupplyService,
    pub cost_service: CostService,
    pub phenology_service: PhenologyService,
    pub report_service: ReportService,
    pub settings_service: SettingsService,
    pub weather: Option<WeatherClient>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Defaults to the configured city
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StageQuery {
    /// `YYYY-MM-DD`
    pub planting_date: Option<String>,
    pub species: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DoseQuery {
    pub stage: String,
    pub species: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SpeciesStagesBody {
    /// Omit to copy the default stage set
    pub stages: Option<Vec<Stage>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AreaQuery {
    pub area_m2: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConditionsQuery {
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FertilizationQuery {
    pub area_m2: f64,
    pub stage: String,
}

/// Multi-select values are comma separated
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalysisQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub areas: Option<String>,
    pub crops: Option<String>,
    pub supply_types: Option<String>,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl From<AnalysisQuery> for ReportFilter {
    fn from(query: AnalysisQuery) -> Self {
        ReportFilter {
            from: query.from,
            to: query.to,
            areas: split_list(query.areas.as_deref()),
            crops: split_list(query.crops.as_deref()),
            supply_types: split_list(query.supply_types.as_deref()),
        }
    }
}

fn status_for(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Import(_) => StatusCode::BAD_REQUEST,
        ServiceError::Db(_) | ServiceError::Export(_) | ServiceError::Settings(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn csv_response(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_production,
        add_production,
        delete_production,
        import_production,
        list_supplies,
        add_supply,
        delete_supply,
        import_supplies,
        list_costs,
        add_cost,
        delete_cost,
        get_weather,
        get_stage,
        get_dose,
        list_species,
        get_species,
        save_species,
        delete_species,
        list_crops,
        get_expected_yield,
        get_climate_advisories,
        get_fertilization,
        get_sanitary_alerts,
        get_space_optimization,
        get_dashboard,
        get_analysis,
        get_supply_history,
        export_production_csv,
        get_settings,
        update_settings,
    ),
    components(schemas(
        HealthResponse,
        ProductionRecord,
        NewProductionRecord,
        SupplyRecord,
        NewSupplyRecord,
        CostRecord,
        NewCostRecord,
        ImportSummary,
        SpeciesPhenology,
        SpeciesStagesBody,
        Stage,
        StageLookup,
        DoseLookup,
        WeatherReport,
        CropProfile,
        ExpectedYield,
        Advisory,
        FertilizationDose,
        SanitaryAlert,
        SpaceOptimization,
        Dashboard,
        AnalysisReport,
        SupplyHistory,
        Settings,
    )),
    tags((name = "farm-tracker", description = "Farm production records and reports"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/production", get(list_production).post(add_production))
        .route("/production/import", post(import_production))
        .route("/production/{id}", delete(delete_production))
        .route("/supplies", get(list_supplies).post(add_supply))
        .route("/supplies/import", post(import_supplies))
        .route("/supplies/{id}", delete(delete_supply))
        .route("/costs", get(list_costs).post(add_cost))
        .route("/costs/{id}", delete(delete_cost))
        .route("/weather", get(get_weather))
        .route("/phenology/stage", get(get_stage))
        .route("/phenology/dose", get(get_dose))
        .route("/phenology/species", get(list_species))
        .route(
            "/phenology/species/{species}",
            get(get_species).put(save_species).delete(delete_species),
        )
        .route("/agronomy/crops", get(list_crops))
        .route("/agronomy/{crop}/yield", get(get_expected_yield))
        .route("/agronomy/{crop}/climate", get(get_climate_advisories))
        .route("/agronomy/{crop}/fertilization", get(get_fertilization))
        .route("/agronomy/{crop}/sanitary", get(get_sanitary_alerts))
        .route("/agronomy/{crop}/space", get(get_space_optimization))
        .route("/dashboard", get(get_dashboard))
        .route("/reports/analysis", get(get_analysis))
        .route("/reports/supplies", get(get_supply_history))
        .route("/reports/production.csv", get(export_production_csv))
        .route("/settings", get(get_settings).put(update_settings))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[utoipa::path(get, path = "/api/v1/health", responses((status = 200, body = HealthResponse)))]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

// Production

#[utoipa::path(
    get,
    path = "/api/v1/production",
    responses((status = 200, description = "All production records", body = [ProductionRecord]))
)]
#[instrument(skip(state))]
async fn list_production(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductionRecord>>, StatusCode> {
    let records = state.production_service.list().await.map_err(|e| {
        error!("Failed to list production records: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    debug!("Returning {} production records", records.len());
    Ok(Json(records))
}

#[utoipa::path(
    post,
    path = "/api/v1/production",
    request_body = NewProductionRecord,
    responses(
        (status = 201, description = "Stored record", body = ProductionRecord),
        (status = 422, description = "Invalid record")
    )
)]
#[instrument(skip(state, record))]
async fn add_production(
    State(state): State<AppState>,
    Json(record): Json<NewProductionRecord>,
) -> Result<(StatusCode, Json<ProductionRecord>), StatusCode> {
    let stored = state.production_service.add(record).await.map_err(|e| {
        error!("Failed to add production record: {}", e);
        status_for(&e)
    })?;
    info!("Stored production record {} for {}", stored.id, stored.area);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/production/{id}",
    params(("id" = i64, Path, description = "Record id")),
    responses((status = 204), (status = 404))
)]
#[instrument(skip(state))]
async fn delete_production(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state.production_service.delete(id).await.map_err(|e| {
        warn!("Failed to delete production record {}: {}", id, e);
        status_for(&e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_sheet(body: Bytes) -> Result<SheetTable, StatusCode> {
    tokio::task::spawn_blocking(move || ExcelImporter::read_bytes(&body))
        .await
        .map_err(|e| {
            error!("Sheet parsing task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            warn!("Rejected uploaded workbook: {}", e);
            StatusCode::BAD_REQUEST
        })
}

#[utoipa::path(
    post,
    path = "/api/v1/production/import",
    request_body(content = Vec<u8>, content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    responses(
        (status = 200, body = ImportSummary),
        (status = 400, description = "Body is not a readable workbook")
    )
)]
#[instrument(skip(state, body), fields(size = body.len()))]
async fn import_production(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportSummary>, StatusCode> {
    let sheet = read_sheet(body).await?;
    let summary = state
        .production_service
        .import_sheet(&sheet)
        .await
        .map_err(|e| {
            error!("Production import failed: {}", e);
            status_for(&e)
        })?;
    info!("Imported {}/{} production rows", summary.inserted, summary.rows_read);
    Ok(Json(summary))
}

// Supplies

#[utoipa::path(
    get,
    path = "/api/v1/supplies",
    responses((status = 200, body = [SupplyRecord]))
)]
#[instrument(skip(state))]
async fn list_supplies(State(state): State<AppState>) -> Result<Json<Vec<SupplyRecord>>, StatusCode> {
    let records = state.supply_service.list().await.map_err(|e| {
        error!("Failed to list supply records: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(records))
}

#[utoipa::path(
    post,
    path = "/api/v1/supplies",
    request_body = NewSupplyRecord,
    responses((status = 201, body = SupplyRecord), (status = 422))
)]
#[instrument(skip(state, record))]
async fn add_supply(
    State(state): State<AppState>,
    Json(record): Json<NewSupplyRecord>,
) -> Result<(StatusCode, Json<SupplyRecord>), StatusCode> {
    let stored = state.supply_service.add(record).await.map_err(|e| {
        error!("Failed to add supply record: {}", e);
        status_for(&e)
    })?;
    info!("Stored supply record {} ({:.2} total)", stored.id, stored.total_cost);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/supplies/{id}",
    params(("id" = i64, Path, description = "Record id")),
    responses((status = 204), (status = 404))
)]
#[instrument(skip(state))]
async fn delete_supply(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state.supply_service.delete(id).await.map_err(|e| {
        warn!("Failed to delete supply record {}: {}", id, e);
        status_for(&e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/supplies/import",
    request_body(content = Vec<u8>, content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    responses((status = 200, body = ImportSummary), (status = 400))
)]
#[instrument(skip(state, body), fields(size = body.len()))]
async fn import_supplies(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportSummary>, StatusCode> {
    let sheet = read_sheet(body).await?;
    let summary = state.supply_service.import_sheet(&sheet).await.map_err(|e| {
        error!("Supply import failed: {}", e);
        status_for(&e)
    })?;
    Ok(Json(summary))
}

// Costs

#[utoipa::path(get, path = "/api/v1/costs", responses((status = 200, body = [CostRecord])))]
#[instrument(skip(state))]
async fn list_costs(State(state): State<AppState>) -> Result<Json<Vec<CostRecord>>, StatusCode> {
    let records = state.cost_service.list().await.map_err(|e| {
        error!("Failed to list cost records: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(records))
}

#[utoipa::path(
    post,
    path = "/api/v1/costs",
    request_body = NewCostRecord,
    responses((status = 201, body = CostRecord), (status = 422))
)]
#[instrument(skip(state, record))]
async fn add_cost(
    State(state): State<AppState>,
    Json(record): Json<NewCostRecord>,
) -> Result<(StatusCode, Json<CostRecord>), StatusCode> {
    let stored = state.cost_service.add(record).await.map_err(|e| {
        error!("Failed to add cost record: {}", e);
        status_for(&e)
    })?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/costs/{id}",
    params(("id" = i64, Path, description = "Record id")),
    responses((status = 204), (status = 404))
)]
#[instrument(skip(state))]
async fn delete_cost(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state.cost_service.delete(id).await.map_err(|e| {
        warn!("Failed to delete cost record {}: {}", id, e);
        status_for(&e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

// Weather

#[utoipa::path(
    get,
    path = "/api/v1/weather",
    params(WeatherQuery),
    responses((status = 200, description = "Report, or null when the lookup failed", body = WeatherReport))
)]
#[instrument(skip(state))]
async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Json<Option<WeatherReport>> {
    let city = match query.city.filter(|c| !c.trim().is_empty()) {
        Some(city) => city,
        None => state.settings_service.get().await.default_city,
    };

    let report = match &state.weather {
        Some(client) => client.fetch(&city).await,
        None => {
            debug!("No weather client configured");
            None
        }
    };
    Json(report)
}

// Phenology

#[utoipa::path(
    get,
    path = "/api/v1/phenology/stage",
    params(StageQuery),
    responses((status = 200, body = StageLookup))
)]
#[instrument(skip(state))]
async fn get_stage(
    State(state): State<AppState>,
    Query(query): Query<StageQuery>,
) -> Result<Json<StageLookup>, StatusCode> {
    let today = Local::now().date_naive();
    let lookup = state
        .phenology_service
        .stage(query.planting_date.as_deref(), query.species.as_deref(), today)
        .await
        .map_err(|e| {
            error!("Failed to load phenology table: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(lookup))
}

#[utoipa::path(
    get,
    path = "/api/v1/phenology/dose",
    params(DoseQuery),
    responses((status = 200, body = DoseLookup))
)]
#[instrument(skip(state))]
async fn get_dose(
    State(state): State<AppState>,
    Query(query): Query<DoseQuery>,
) -> Result<Json<DoseLookup>, StatusCode> {
    let dose = state
        .phenology_service
        .dose(&query.stage, query.species.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to load phenology table: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(dose))
}

#[utoipa::path(
    get,
    path = "/api/v1/phenology/species",
    responses((status = 200, body = [SpeciesPhenology]))
)]
#[instrument(skip(state))]
async fn list_species(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpeciesPhenology>>, StatusCode> {
    let species = state.phenology_service.list_species().await.map_err(|e| {
        error!("Failed to list species overrides: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(species))
}

#[utoipa::path(
    get,
    path = "/api/v1/phenology/species/{species}",
    params(("species" = String, Path, description = "Species name")),
    responses((status = 200, body = SpeciesPhenology), (status = 404))
)]
#[instrument(skip(state))]
async fn get_species(
    State(state): State<AppState>,
    Path(species): Path<String>,
) -> Result<Json<SpeciesPhenology>, StatusCode> {
    let found = state
        .phenology_service
        .get_species(&species)
        .await
        .map_err(|e| {
            debug!("No stages for {}: {}", species, e);
            status_for(&e)
        })?;
    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/v1/phenology/species/{species}",
    params(("species" = String, Path, description = "Species name")),
    request_body = SpeciesStagesBody,
    responses((status = 200, body = SpeciesPhenology), (status = 422))
)]
#[instrument(skip(state, body))]
async fn save_species(
    State(state): State<AppState>,
    Path(species): Path<String>,
    Json(body): Json<SpeciesStagesBody>,
) -> Result<Json<SpeciesPhenology>, StatusCode> {
    let saved = state
        .phenology_service
        .save_species(&species, body.stages)
        .await
        .map_err(|e| {
            error!("Failed to save stages for {}: {}", species, e);
            status_for(&e)
        })?;
    Ok(Json(saved))
}

#[utoipa::path(
    delete,
    path = "/api/v1/phenology/species/{species}",
    params(("species" = String, Path, description = "Species name")),
    responses((status = 204), (status = 404))
)]
#[instrument(skip(state))]
async fn delete_species(
    State(state): State<AppState>,
    Path(species): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .phenology_service
        .delete_species(&species)
        .await
        .map_err(|e| {
            warn!("Failed to delete stages for {}: {}", species, e);
            status_for(&e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

// Agronomy

#[utoipa::path(get, path = "/api/v1/agronomy/crops", responses((status = 200, body = [CropProfile])))]
async fn list_crops() -> Json<Vec<CropProfile>> {
    Json(agronomy::PROFILES.iter().map(CropProfile::from).collect())
}

fn unknown_crop(crop: &str) -> StatusCode {
    warn!("Unknown crop {}", crop);
    StatusCode::NOT_FOUND
}

#[utoipa::path(
    get,
    path = "/api/v1/agronomy/{crop}/yield",
    params(("crop" = String, Path, description = "Crop name"), AreaQuery),
    responses((status = 200, body = ExpectedYield), (status = 404))
)]
async fn get_expected_yield(
    Path(crop): Path<String>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<ExpectedYield>, StatusCode> {
    agronomy::expected_yield(&crop, query.area_m2)
        .map(Json)
        .ok_or_else(|| unknown_crop(&crop))
}

#[utoipa::path(
    get,
    path = "/api/v1/agronomy/{crop}/climate",
    params(("crop" = String, Path, description = "Crop name"), ConditionsQuery),
    responses((status = 200, body = [Advisory]), (status = 404))
)]
async fn get_climate_advisories(
    Path(crop): Path<String>,
    Query(query): Query<ConditionsQuery>,
) -> Result<Json<Vec<Advisory>>, StatusCode> {
    agronomy::profile(&crop).ok_or_else(|| unknown_crop(&crop))?;
    Ok(Json(agronomy::climate_advisories(
        &crop,
        query.temperature,
        query.humidity,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/agronomy/{crop}/fertilization",
    params(("crop" = String, Path, description = "Crop name"), FertilizationQuery),
    responses((status = 200, body = FertilizationDose), (status = 404))
)]
async fn get_fertilization(
    Path(crop): Path<String>,
    Query(query): Query<FertilizationQuery>,
) -> Result<Json<FertilizationDose>, StatusCode> {
    agronomy::fertilization_dose(&crop, query.area_m2, &query.stage)
        .map(Json)
        .ok_or_else(|| unknown_crop(&crop))
}

#[utoipa::path(
    get,
    path = "/api/v1/agronomy/{crop}/sanitary",
    params(("crop" = String, Path, description = "Crop name"), ConditionsQuery),
    responses((status = 200, body = [SanitaryAlert]), (status = 404))
)]
async fn get_sanitary_alerts(
    Path(crop): Path<String>,
    Query(query): Query<ConditionsQuery>,
) -> Result<Json<Vec<SanitaryAlert>>, StatusCode> {
    agronomy::profile(&crop).ok_or_else(|| unknown_crop(&crop))?;
    Ok(Json(agronomy::sanitary_alerts(
        &crop,
        query.temperature,
        query.humidity,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/agronomy/{crop}/space",
    params(("crop" = String, Path, description = "Crop name"), AreaQuery),
    responses((status = 200, body = SpaceOptimization), (status = 404))
)]
async fn get_space_optimization(
    Path(crop): Path<String>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<SpaceOptimization>, StatusCode> {
    agronomy::space_optimization(&crop, query.area_m2)
        .map(Json)
        .ok_or_else(|| unknown_crop(&crop))
}

// Reports

#[utoipa::path(get, path = "/api/v1/dashboard", responses((status = 200, body = Dashboard)))]
#[instrument(skip(state))]
async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, StatusCode> {
    let dashboard = state.report_service.dashboard().await.map_err(|e| {
        error!("Failed to build dashboard: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/analysis",
    params(AnalysisQuery),
    responses((status = 200, body = AnalysisReport))
)]
#[instrument(skip(state))]
async fn get_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisReport>, StatusCode> {
    let filter = ReportFilter::from(query);
    let report = state.report_service.analysis(&filter).await.map_err(|e| {
        error!("Failed to build analysis report: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    info!(
        "Analysis over {} production and {} supply records",
        report.production_count, report.supply_count
    );
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/supplies",
    params(AnalysisQuery),
    responses((status = 200, body = SupplyHistory))
)]
#[instrument(skip(state))]
async fn get_supply_history(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<SupplyHistory>, StatusCode> {
    let filter = ReportFilter::from(query);
    let history = state.report_service.supply_history(&filter).await.map_err(|e| {
        error!("Failed to build supply history: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/production.csv",
    params(AnalysisQuery),
    responses((status = 200, description = "Filtered production records", content_type = "text/csv", body = String))
)]
#[instrument(skip(state))]
async fn export_production_csv(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let filter = ReportFilter::from(query);
    let csv = state
        .report_service
        .production_csv(&filter)
        .await
        .map_err(|e| {
            error!("Failed to export production CSV: {}", e);
            status_for(&e)
        })?;
    Ok(csv_response(csv))
}

// Settings

#[utoipa::path(get, path = "/api/v1/settings", responses((status = 200, body = Settings)))]
async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings_service.get().await)
}

#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = Settings,
    responses((status = 200, body = Settings), (status = 422))
)]
#[instrument(skip(state, settings))]
async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, StatusCode> {
    let saved = state.settings_service.update(settings).await.map_err(|e| {
        error!("Failed to save settings: {}", e);
        status_for(&e)
    })?;
    Ok(Json(saved))
}
