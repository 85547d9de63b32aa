use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::phenology::Stage;

// Database entity models
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct ProductionRecord {
    pub id: i64,
    #[sqlx(rename = "record_date")]
    pub date: Option<NaiveDate>,
    pub area: String,
    pub crop: String,
    pub boxes_grade1: i64,
    pub boxes_grade2: i64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct SupplyRecord {
    pub id: i64,
    #[sqlx(rename = "record_date")]
    pub date: Option<NaiveDate>,
    pub area: String,
    pub crop: Option<String>,
    /// Label of a [`SupplyType`]; legacy rows may carry other text
    pub supply_type: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub supplier: String,
    pub lot: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct CostRecord {
    pub id: i64,
    #[sqlx(rename = "record_date")]
    pub date: Option<NaiveDate>,
    pub cost_type: String,
    pub description: String,
    pub value: f64,
    pub area: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SpeciesPhenology {
    pub species: String,
    pub stages: Vec<Stage>,
}

// API response DTOs

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImportSummary {
    /// Data rows found in the sheet
    pub rows_read: usize,
    pub inserted: usize,
}

// Insert payloads

/// A harvest entry before it is stored. Weather readings left empty are
/// filled by the production service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct NewProductionRecord {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub crop: String,
    #[serde(default)]
    pub boxes_grade1: u32,
    #[serde(default)]
    pub boxes_grade2: u32,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rainfall_mm: Option<f64>,
    #[serde(default)]
    pub note: String,
}

impl NewProductionRecord {
    pub fn has_complete_weather(&self) -> bool {
        self.temperature_c.is_some() && self.humidity_pct.is_some() && self.rainfall_mm.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewSupplyRecord {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub area: String,
    pub crop: Option<String>,
    pub supply_type: SupplyType,
    pub quantity: f64,
    pub unit: Unit,
    pub unit_cost: f64,
    /// Recomputed as `quantity * unit_cost` when zero
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub lot: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewCostRecord {
    pub date: Option<NaiveDate>,
    pub cost_type: String,
    #[serde(default)]
    pub description: String,
    pub value: f64,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SupplyType {
    #[serde(rename = "Organic Fertilizer", alias = "Adubo Orgânico")]
    OrganicFertilizer,
    #[serde(rename = "Chemical Fertilizer", alias = "Adubo Químico")]
    ChemicalFertilizer,
    #[serde(rename = "Pesticide", alias = "Defensivo Agrícola")]
    Pesticide,
    #[serde(rename = "Seed", alias = "Semente")]
    Seed,
    #[serde(rename = "Seedling", alias = "Muda")]
    Seedling,
    #[serde(rename = "Foliar Fertilizer", alias = "Fertilizante Foliar")]
    FoliarFertilizer,
    #[serde(rename = "Soil Corrective", alias = "Corretivo de Solo")]
    SoilCorrective,
    #[serde(rename = "Irrigation Supply", alias = "Insumo para Irrigação")]
    IrrigationSupply,
    #[serde(rename = "Other", alias = "Outros")]
    Other,
}

impl SupplyType {
    pub const ALL: [SupplyType; 9] = [
        SupplyType::OrganicFertilizer,
        SupplyType::ChemicalFertilizer,
        SupplyType::Pesticide,
        SupplyType::Seed,
        SupplyType::Seedling,
        SupplyType::FoliarFertilizer,
        SupplyType::SoilCorrective,
        SupplyType::IrrigationSupply,
        SupplyType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SupplyType::OrganicFertilizer => "Organic Fertilizer",
            SupplyType::ChemicalFertilizer => "Chemical Fertilizer",
            SupplyType::Pesticide => "Pesticide",
            SupplyType::Seed => "Seed",
            SupplyType::Seedling => "Seedling",
            SupplyType::FoliarFertilizer => "Foliar Fertilizer",
            SupplyType::SoilCorrective => "Soil Corrective",
            SupplyType::IrrigationSupply => "Irrigation Supply",
            SupplyType::Other => "Other",
        }
    }

    pub fn legacy_label(self) -> &'static str {
        match self {
            SupplyType::OrganicFertilizer => "Adubo Orgânico",
            SupplyType::ChemicalFertilizer => "Adubo Químico",
            SupplyType::Pesticide => "Defensivo Agrícola",
            SupplyType::Seed => "Semente",
            SupplyType::Seedling => "Muda",
            SupplyType::FoliarFertilizer => "Fertilizante Foliar",
            SupplyType::SoilCorrective => "Corretivo de Solo",
            SupplyType::IrrigationSupply => "Insumo para Irrigação",
            SupplyType::Other => "Outros",
        }
    }

    /// Case-insensitive match against either label
    pub fn parse_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|t| {
            t.label().eq_ignore_ascii_case(text)
                || t.legacy_label().to_lowercase() == text.to_lowercase()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Unit {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "mL")]
    Ml,
    #[serde(rename = "unit", alias = "unidade")]
    Unit,
    #[serde(rename = "bag", alias = "saco")]
    Bag,
    #[serde(rename = "box", alias = "caixa")]
    Box,
    #[serde(rename = "pack", alias = "pacote")]
    Pack,
}

impl Unit {
    pub const ALL: [Unit; 8] = [
        Unit::Kg,
        Unit::G,
        Unit::L,
        Unit::Ml,
        Unit::Unit,
        Unit::Bag,
        Unit::Box,
        Unit::Pack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "L",
            Unit::Ml => "mL",
            Unit::Unit => "unit",
            Unit::Bag => "bag",
            Unit::Box => "box",
            Unit::Pack => "pack",
        }
    }

    fn legacy_label(self) -> &'static str {
        match self {
            Unit::Unit => "unidade",
            Unit::Bag => "saco",
            Unit::Box => "caixa",
            Unit::Pack => "pacote",
            other => other.label(),
        }
    }

    /// Exact match first so `L`/`mL` keep their case, then case-insensitive
    pub fn parse_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|u| u.label() == text || u.legacy_label() == text)
            .or_else(|| {
                Self::ALL.into_iter().find(|u| {
                    u.label().eq_ignore_ascii_case(text) || u.legacy_label().eq_ignore_ascii_case(text)
                })
            })
    }
}
