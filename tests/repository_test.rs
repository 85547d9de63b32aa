// Repository tests against a migrated in-memory SQLite database

mod common;

use common::{date, test_pool};
use farm_tracker_service::db::{
    CostRepository, NewCostRecord, NewProductionRecord, NewSupplyRecord, PhenologyRepository,
    ProductionRepository, SupplyRepository, SupplyType, Unit,
};
use farm_tracker_service::phenology::Stage;

fn harvest(day: u32, area: &str, grade1: u32, grade2: u32) -> NewProductionRecord {
    NewProductionRecord {
        date: Some(date(2025, 3, day)),
        area: area.to_string(),
        crop: "Tomato".to_string(),
        boxes_grade1: grade1,
        boxes_grade2: grade2,
        temperature_c: Some(24.0),
        humidity_pct: Some(70.0),
        rainfall_mm: Some(0.0),
        note: String::new(),
    }
}

fn seed_purchase(total_cost: f64) -> NewSupplyRecord {
    NewSupplyRecord {
        date: Some(date(2025, 2, 10)),
        area: "Greenhouse 1".to_string(),
        crop: Some("Tomato".to_string()),
        supply_type: SupplyType::Seed,
        quantity: 100.0,
        unit: Unit::Unit,
        unit_cost: 0.5,
        total_cost,
        supplier: "Agro Sul".to_string(),
        lot: "L-01".to_string(),
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_production_insert_and_find_all_orders_by_date() {
    let repo = ProductionRepository::new(test_pool().await);

    let later = repo.insert(&harvest(5, "Greenhouse 2", 40, 5)).await.unwrap();
    let earlier = repo.insert(&harvest(1, "Greenhouse 1", 50, 10)).await.unwrap();
    assert!(later < earlier);

    let records = repo.find_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, earlier);
    assert_eq!(records[0].date, Some(date(2025, 3, 1)));
    assert_eq!(records[0].boxes_grade1, 50);
    assert_eq!(records[1].area, "Greenhouse 2");
}

#[tokio::test]
async fn test_production_latest_is_highest_id() {
    let repo = ProductionRepository::new(test_pool().await);
    assert!(repo.find_latest().await.unwrap().is_none());

    repo.insert(&harvest(20, "Greenhouse 1", 10, 0)).await.unwrap();
    let newest = repo.insert(&harvest(2, "Greenhouse 3", 12, 1)).await.unwrap();

    let latest = repo.find_latest().await.unwrap().unwrap();
    assert_eq!(latest.id, newest);
    assert_eq!(latest.area, "Greenhouse 3");
}

#[tokio::test]
async fn test_production_missing_weather_stored_as_zero() {
    let repo = ProductionRepository::new(test_pool().await);
    let record = NewProductionRecord {
        date: None,
        area: "Field".to_string(),
        boxes_grade1: 3,
        ..Default::default()
    };

    let id = repo.insert(&record).await.unwrap();
    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.date, None);
    assert_eq!(stored.temperature_c, 0.0);
    assert_eq!(stored.crop, "");
}

#[tokio::test]
async fn test_production_insert_many_and_delete() {
    let repo = ProductionRepository::new(test_pool().await);
    let inserted = repo
        .insert_many(&[harvest(1, "A", 1, 0), harvest(2, "B", 2, 0), harvest(3, "C", 3, 0)])
        .await
        .unwrap();
    assert_eq!(inserted, 3);

    let records = repo.find_all().await.unwrap();
    assert!(repo.delete(records[1].id).await.unwrap());
    assert!(!repo.delete(records[1].id).await.unwrap());
    assert_eq!(repo.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_supply_round_trips_labels() {
    let repo = SupplyRepository::new(test_pool().await);
    let id = repo.insert(&seed_purchase(50.0)).await.unwrap();

    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.supply_type, "Seed");
    assert_eq!(stored.unit, "unit");
    assert_eq!(stored.crop.as_deref(), Some("Tomato"));
    assert_eq!(stored.total_cost, 50.0);
}

#[tokio::test]
async fn test_supply_without_crop_and_delete() {
    let repo = SupplyRepository::new(test_pool().await);
    let mut record = seed_purchase(10.0);
    record.crop = None;
    record.date = None;

    let inserted = repo.insert_many(&[record, seed_purchase(20.0)]).await.unwrap();
    assert_eq!(inserted, 2);

    let all = repo.find_all().await.unwrap();
    let undated = all.iter().find(|r| r.date.is_none()).unwrap();
    assert_eq!(undated.crop, None);

    assert!(repo.delete(undated.id).await.unwrap());
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cost_insert_find_delete() {
    let repo = CostRepository::new(test_pool().await);
    let id = repo
        .insert(&NewCostRecord {
            date: Some(date(2025, 4, 1)),
            cost_type: "Labor".to_string(),
            description: "Harvest crew".to_string(),
            value: 800.0,
            area: "Greenhouse 1".to_string(),
            notes: String::new(),
        })
        .await
        .unwrap();

    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.cost_type, "Labor");
    assert_eq!(stored.value, 800.0);
    assert_eq!(repo.find_all().await.unwrap().len(), 1);

    assert!(repo.delete(id).await.unwrap());
    assert!(repo.find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_phenology_upsert_replaces_stages() {
    let repo = PhenologyRepository::new(test_pool().await);

    repo.upsert("Tomato", &[Stage::new("Vegetative", "0-20", 1.0, 1.0)])
        .await
        .unwrap();
    repo.upsert(
        "Tomato",
        &[
            Stage::new("Vegetative", "0-25", 1.5, 1.0),
            Stage::new("Flowering", "26-50", 3.0, 2.0),
        ],
    )
    .await
    .unwrap();

    let tomato = repo.find("Tomato").await.unwrap().unwrap();
    assert_eq!(tomato.stages.len(), 2);
    assert_eq!(tomato.stages[0].days, "0-25");

    let map = repo.load_map().await.unwrap();
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("Tomato"));
}

#[tokio::test]
async fn test_phenology_bad_json_loads_as_empty() {
    let pool = test_pool().await;
    sqlx::query("INSERT INTO species_phenology (species, stages) VALUES (?, ?)")
        .bind("Pepper")
        .bind("not json")
        .execute(&pool)
        .await
        .unwrap();

    let repo = PhenologyRepository::new(pool);
    let pepper = repo.find("Pepper").await.unwrap().unwrap();
    assert!(pepper.stages.is_empty());
}

#[tokio::test]
async fn test_phenology_delete() {
    let repo = PhenologyRepository::new(test_pool().await);
    repo.upsert("Squash", &[]).await.unwrap();

    assert!(repo.delete("Squash").await.unwrap());
    assert!(!repo.delete("Squash").await.unwrap());
    assert!(repo.find_all().await.unwrap().is_empty());
}
