// Service tests: services wired to an in-memory database, a temporary
// settings file and, where needed, a mocked weather API

mod common;

use std::time::Duration;

use chrono::Duration as Days;
use common::{date, sheet, test_pool};
use farm_tracker_service::analytics::ReportFilter;
use farm_tracker_service::db::{
    CostRepository, NewCostRecord, NewProductionRecord, NewSupplyRecord, PhenologyRepository,
    ProductionRepository, SupplyRepository, SupplyType, Unit,
};
use farm_tracker_service::importers::Cell;
use farm_tracker_service::phenology::Stage;
use farm_tracker_service::services::phenology_service::StageOutcome;
use farm_tracker_service::services::report_service::Table;
use farm_tracker_service::services::{
    CostService, PhenologyService, ProductionService, ReportService, ServiceError,
    SettingsService, SupplyService,
};
use farm_tracker_service::settings::SettingsStore;
use farm_tracker_service::weather::WeatherClient;
use mockito::{Matcher, Server};
use tempfile::TempDir;

fn settings_service(dir: &TempDir) -> SettingsService {
    SettingsService::load(SettingsStore::new(dir.path().join("config.json"))).unwrap()
}

fn fertilizer_purchase(quantity: f64, unit_cost: f64, total_cost: f64) -> NewSupplyRecord {
    NewSupplyRecord {
        date: Some(date(2025, 3, 1)),
        area: "Greenhouse 1".to_string(),
        crop: Some("Tomato".to_string()),
        supply_type: SupplyType::ChemicalFertilizer,
        quantity,
        unit: Unit::Kg,
        unit_cost,
        total_cost,
        supplier: String::new(),
        lot: String::new(),
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_supply_total_cost_recomputed_when_zero() {
    let service = SupplyService::new(SupplyRepository::new(test_pool().await));

    let stored = service
        .add(fertilizer_purchase(10.0, 4.0, 0.0))
        .await
        .unwrap();
    assert_eq!(stored.total_cost, 40.0);
    assert_eq!(stored.supply_type, "Chemical Fertilizer");

    let explicit = service
        .add(fertilizer_purchase(10.0, 4.0, 35.0))
        .await
        .unwrap();
    assert_eq!(explicit.total_cost, 35.0);
}

#[tokio::test]
async fn test_supply_rejects_negative_quantity() {
    let service = SupplyService::new(SupplyRepository::new(test_pool().await));
    let result = service.add(fertilizer_purchase(-1.0, 4.0, 0.0)).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_supply_sheet_import_with_legacy_headers() {
    let service = SupplyService::new(SupplyRepository::new(test_pool().await));
    let upload = sheet(
        &["Data", "Cultura", "Tipo", "Quantidade", "Unidade", "Custo_Unitario", "Custo_Total"],
        vec![
            vec![
                Cell::text("2025-03-01"),
                Cell::text("Tomato"),
                Cell::text("Adubo Químico"),
                Cell::Float(10.0),
                Cell::text("kg"),
                Cell::Float(4.0),
                Cell::Empty,
            ],
            vec![
                Cell::text("02/03/2025"),
                Cell::Empty,
                Cell::text("Compost tea"),
                Cell::Int(2),
                Cell::text("ton"),
                Cell::Float(5.0),
                Cell::Float(12.0),
            ],
        ],
    );

    let summary = service.import_sheet(&upload).await.unwrap();
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.inserted, 2);

    let records = service.list().await.unwrap();
    assert_eq!(records[0].date, Some(date(2025, 3, 1)));
    assert_eq!(records[0].supply_type, "Chemical Fertilizer");
    assert_eq!(records[0].total_cost, 40.0);
    assert_eq!(records[1].supply_type, "Other");
    assert_eq!(records[1].unit, "kg");
    assert_eq!(records[1].crop, None);
    assert_eq!(records[1].total_cost, 12.0);
}

#[tokio::test]
async fn test_production_add_without_weather_client_uses_fallbacks() {
    let dir = TempDir::new().unwrap();
    let service = ProductionService::new(
        ProductionRepository::new(test_pool().await),
        settings_service(&dir),
        None,
    );

    let stored = service
        .add(NewProductionRecord {
            date: Some(date(2025, 3, 1)),
            area: "Greenhouse 1".to_string(),
            crop: "Tomato".to_string(),
            boxes_grade1: 40,
            boxes_grade2: 6,
            humidity_pct: Some(72.0),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(stored.temperature_c, 25.0);
    assert_eq!(stored.humidity_pct, 72.0);
    assert_eq!(stored.rainfall_mm, 0.0);
}

#[tokio::test]
async fn test_production_add_fills_from_live_weather() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/weather")
        .match_query(Matcher::UrlEncoded("q".into(), "Londrina".into()))
        .with_status(200)
        .with_body(r#"{"main": {"temp": 31.5, "humidity": 58}, "rain": {"1h": 0.4}}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let weather = WeatherClient::new(server.url(), "key", Duration::from_secs(5)).unwrap();
    let service = ProductionService::new(
        ProductionRepository::new(test_pool().await),
        settings_service(&dir),
        Some(weather),
    );

    let stored = service
        .add(NewProductionRecord {
            date: Some(date(2025, 3, 2)),
            area: "Greenhouse 2".to_string(),
            crop: "Japanese Cucumber".to_string(),
            boxes_grade1: 12,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(stored.temperature_c, 31.5);
    assert_eq!(stored.humidity_pct, 58.0);
    assert_eq!(stored.rainfall_mm, 0.4);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_production_sheet_import_normalizes_rows() {
    let dir = TempDir::new().unwrap();
    let service = ProductionService::new(
        ProductionRepository::new(test_pool().await),
        settings_service(&dir),
        None,
    );
    let upload = sheet(
        &["Data", "Estufa", "crop", "Primeira", "Segunda"],
        vec![
            vec![
                Cell::Float(45658.0),
                Cell::text("Greenhouse 1"),
                Cell::text("Tomato"),
                Cell::Float(30.7),
                Cell::text("abc"),
            ],
            vec![
                Cell::text("garbage"),
                Cell::text("Greenhouse 2"),
                Cell::text("Tomato"),
                Cell::Int(-4),
                Cell::Int(3),
            ],
        ],
    );

    let summary = service.import_sheet(&upload).await.unwrap();
    assert_eq!(summary.inserted, 2);

    let records = service.list().await.unwrap();
    let dated = records.iter().find(|r| r.area == "Greenhouse 1").unwrap();
    assert_eq!(dated.date, Some(date(2025, 1, 1)));
    assert_eq!(dated.boxes_grade1, 30);
    assert_eq!(dated.boxes_grade2, 0);

    let undated = records.iter().find(|r| r.area == "Greenhouse 2").unwrap();
    assert_eq!(undated.date, None);
    assert_eq!(undated.boxes_grade1, 0);
    assert_eq!(undated.boxes_grade2, 3);
}

#[tokio::test]
async fn test_production_delete_missing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let service = ProductionService::new(
        ProductionRepository::new(test_pool().await),
        settings_service(&dir),
        None,
    );
    assert!(matches!(service.delete(99).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_cost_validation() {
    let service = CostService::new(CostRepository::new(test_pool().await));
    let mut record = NewCostRecord {
        date: Some(date(2025, 4, 1)),
        cost_type: "Energy".to_string(),
        description: String::new(),
        value: 120.0,
        area: String::new(),
        notes: String::new(),
    };

    let stored = service.add(record.clone()).await.unwrap();
    assert_eq!(stored.value, 120.0);

    record.cost_type = " ".to_string();
    assert!(matches!(service.add(record).await, Err(ServiceError::Validation(_))));
    assert_eq!(service.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_phenology_stage_from_default_set() {
    let dir = TempDir::new().unwrap();
    let service = PhenologyService::new(
        PhenologyRepository::new(test_pool().await),
        settings_service(&dir),
    );
    let today = date(2025, 6, 1);
    let planted = (today - Days::days(100)).format("%Y-%m-%d").to_string();

    let lookup = service.stage(Some(&planted), None, today).await.unwrap();
    assert_eq!(lookup.outcome, StageOutcome::InStage);
    assert_eq!(lookup.label, "Maturação");
    assert_eq!(lookup.elapsed_days, Some(100));

    let missing = service.stage(None, None, today).await.unwrap();
    assert_eq!(missing.outcome, StageOutcome::NoDate);

    let invalid = service.stage(Some("31/31/2025"), None, today).await.unwrap();
    assert_eq!(invalid.outcome, StageOutcome::InvalidDate);
}

#[tokio::test]
async fn test_phenology_species_override() {
    let dir = TempDir::new().unwrap();
    let service = PhenologyService::new(
        PhenologyRepository::new(test_pool().await),
        settings_service(&dir),
    );

    service
        .save_species(
            "Tomato",
            Some(vec![
                Stage::new("Early", "0-10", 1.0, 0.5),
                Stage::new("Late", "11-200", 2.0, 1.0),
            ]),
        )
        .await
        .unwrap();
    let copied = service.save_species("Cucumber", None).await.unwrap();
    assert_eq!(copied.stages.len(), 4);

    let today = date(2025, 6, 1);
    let planted = (today - Days::days(150)).format("%Y-%m-%d").to_string();

    let tomato = service.stage(Some(&planted), Some("Tomato"), today).await.unwrap();
    assert_eq!(tomato.label, "Late");

    // Unknown species fall back to the default set, which ends at day 120
    let other = service.stage(Some(&planted), Some("Okra"), today).await.unwrap();
    assert_eq!(other.outcome, StageOutcome::HarvestComplete);

    let dose = service.dose("Late", Some("Tomato")).await.unwrap();
    assert_eq!(dose.fertilizer_kg_ha, Some(2.0));
    let none = service.dose("Floração", Some("Tomato")).await.unwrap();
    assert_eq!(none.fertilizer_kg_ha, None);

    assert_eq!(service.list_species().await.unwrap().len(), 2);
    service.delete_species("Tomato").await.unwrap();
    assert!(matches!(
        service.delete_species("Tomato").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_settings_update_persists() {
    let dir = TempDir::new().unwrap();
    let service = settings_service(&dir);

    let mut settings = service.get().await;
    assert_eq!(settings.default_city, "Londrina");
    settings.default_city = "Maringá".to_string();
    settings.average_box_price = 42.0;
    service.update(settings).await.unwrap();

    let reloaded = settings_service(&dir).get().await;
    assert_eq!(reloaded.default_city, "Maringá");
    assert_eq!(reloaded.average_box_price, 42.0);

    let mut invalid = reloaded.clone();
    invalid.default_city = "  ".to_string();
    assert!(matches!(
        service.update(invalid).await,
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(service.get().await.default_city, "Maringá");
}

#[tokio::test]
async fn test_report_service_analysis_and_exports() {
    let pool = test_pool().await;
    let dir = TempDir::new().unwrap();
    let production_repo = ProductionRepository::new(pool.clone());
    let supply_repo = SupplyRepository::new(pool.clone());

    for (day, area, g1, g2) in [(1, "Greenhouse 1", 80, 20), (2, "Greenhouse 2", 60, 40)] {
        production_repo
            .insert(&NewProductionRecord {
                date: Some(date(2025, 3, day)),
                area: area.to_string(),
                crop: "Tomato".to_string(),
                boxes_grade1: g1,
                boxes_grade2: g2,
                temperature_c: Some(24.0),
                humidity_pct: Some(70.0),
                rainfall_mm: Some(0.0),
                note: String::new(),
            })
            .await
            .unwrap();
    }
    supply_repo
        .insert(&fertilizer_purchase(10.0, 4.0, 40.0))
        .await
        .unwrap();

    let service = ReportService::new(
        production_repo,
        supply_repo,
        CostRepository::new(pool),
        settings_service(&dir),
    );

    let filter = ReportFilter {
        areas: vec!["Greenhouse 1".to_string()],
        ..Default::default()
    };
    let report = service.analysis(&filter).await.unwrap();
    assert_eq!(report.production_count, 1);
    assert_eq!(report.supply_count, 1);

    let csv = service.production_csv(&filter).await.unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.starts_with("id,date,area,crop"));

    let costs = service.table_csv(Table::Costs).await.unwrap();
    assert_eq!(costs.lines().count(), 1);

    let dashboard = service.dashboard().await.unwrap();
    assert_eq!(dashboard.kpis.total_grade1, 140);
    assert_eq!(dashboard.latest.unwrap().area, "Greenhouse 2");
}
