//! User-editable settings document.
//!
//! The document is a single JSON file. It is created with defaults on first
//! access and always rewritten whole on save. Keys written by the legacy
//! spreadsheet-era tool (`cidade`, `fenologia_padrao`, ...) are accepted as
//! aliases so an old `config.json` keeps loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::db::SupplyType;
use crate::phenology::{Stage, StageSet};

pub const DEFAULT_CITY: &str = "Londrina";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "cidade")]
    pub default_city: String,
    #[serde(alias = "fenologia_padrao")]
    pub default_phenology: StageSet,
    /// Mean grade-2 percentage above which the quality alert fires
    #[serde(alias = "alerta_pct_segunda")]
    pub grade2_pct_alert_threshold: f64,
    #[serde(alias = "alerta_prod_baixo_pct")]
    pub low_yield_pct_alert_threshold: f64,
    #[serde(alias = "preco_medio_caixa")]
    pub average_box_price: f64,
    /// Reference unit cost per supply type label
    #[serde(alias = "custo_medio_insumos")]
    pub average_supply_costs: BTreeMap<String, f64>,
}

impl Default for Settings {
    fn default() -> Self {
        let average_supply_costs = [
            (SupplyType::OrganicFertilizer, 2.5),
            (SupplyType::ChemicalFertilizer, 4.0),
            (SupplyType::Pesticide, 35.0),
            (SupplyType::Seed, 0.5),
            (SupplyType::Seedling, 1.2),
            (SupplyType::FoliarFertilizer, 15.0),
            (SupplyType::SoilCorrective, 1.8),
        ]
        .into_iter()
        .map(|(kind, cost)| (kind.label().to_string(), cost))
        .collect();

        Self {
            default_city: DEFAULT_CITY.to_string(),
            default_phenology: StageSet {
                stages: vec![
                    Stage::new("Germinação/Vegetativo", "0-30", 2.0, 1.5),
                    Stage::new("Floração", "31-60", 4.0, 2.0),
                    Stage::new("Frutificação", "61-90", 3.0, 2.5),
                    Stage::new("Maturação", "91-120", 1.0, 1.0),
                ],
            },
            grade2_pct_alert_threshold: 25.0,
            low_yield_pct_alert_threshold: 30.0,
            average_box_price: 30.0,
            average_supply_costs,
        }
    }
}

/// File-backed store for [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, writing the defaults first if the file does not exist
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_or_init(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            info!("Settings file not found, creating it with defaults");
            let settings = Settings::default();
            self.save(&settings)?;
            return Ok(settings);
        }

        let raw = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        debug!(
            "Loaded settings (city={}, {} default stages)",
            settings.default_city,
            settings.default_phenology.stages.len()
        );
        Ok(settings)
    }

    /// Rewrite the whole document
    #[instrument(skip(self, settings), fields(path = %self.path.display()))]
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        debug!("Settings written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_init_creates_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));

        let settings = store.load_or_init().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_then_load_keeps_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));

        let mut settings = store.load_or_init().unwrap();
        settings.default_city = "Maringá".to_string();
        settings.average_box_price = 42.5;
        store.save(&settings).unwrap();

        let reloaded = store.load_or_init().unwrap();
        assert_eq!(reloaded.default_city, "Maringá");
        assert_eq!(reloaded.average_box_price, 42.5);
    }

    #[test]
    fn test_legacy_document_keys_are_accepted() {
        let legacy = r#"{
            "cidade": "Londrina",
            "fenologia_padrao": {
                "estagios": [
                    {"nome": "Floração", "dias": "31-60", "adubo": 4, "agua": 2.0}
                ]
            },
            "alerta_pct_segunda": 20.0,
            "preco_medio_caixa": 35.0
        }"#;

        let settings: Settings = serde_json::from_str(legacy).unwrap();
        assert_eq!(settings.default_phenology.stages.len(), 1);
        assert_eq!(settings.default_phenology.stages[0].name, "Floração");
        assert_eq!(settings.default_phenology.stages[0].fertilizer, 4.0);
        assert_eq!(settings.grade2_pct_alert_threshold, 20.0);
        // Missing keys fall back to defaults
        assert_eq!(settings.low_yield_pct_alert_threshold, 30.0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let result = SettingsStore::new(path).load_or_init();
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }
}
