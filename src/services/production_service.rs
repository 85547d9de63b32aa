use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, ImportSummary, NewProductionRecord, ProductionRecord, ProductionRepository};
use crate::importers::{normalize_production_sheet, production_rows, SheetTable};
use crate::services::{ServiceError, SettingsService};
use crate::weather::{CurrentConditions, WeatherClient};

pub const FALLBACK_TEMPERATURE_C: f64 = 25.0;
pub const FALLBACK_HUMIDITY_PCT: f64 = 65.0;
pub const FALLBACK_RAINFALL_MM: f64 = 0.0;

#[derive(Clone)]
pub struct ProductionService {
    repo: ProductionRepository,
    settings: SettingsService,
    weather: Option<WeatherClient>,
}

impl ProductionService {
    pub fn new(
        repo: ProductionRepository,
        settings: SettingsService,
        weather: Option<WeatherClient>,
    ) -> Self {
        Self {
            repo,
            settings,
            weather,
        }
    }

    pub async fn list(&self) -> Result<Vec<ProductionRecord>, DbError> {
        self.repo.find_all().await
    }

    pub async fn latest(&self) -> Result<Option<ProductionRecord>, DbError> {
        self.repo.find_latest().await
    }

    /// Store a manual entry. Readings left empty come from the live weather
    /// for the default city, or the fixed fallbacks when that lookup fails.
    #[instrument(skip(self, record), fields(area = %record.area, crop = %record.crop))]
    pub async fn add(&self, mut record: NewProductionRecord) -> Result<ProductionRecord, ServiceError> {
        if !record.has_complete_weather() {
            let live = self.current_weather().await;
            fill_weather(&mut record, live.as_ref());
        }

        let id = self.repo.insert(&record).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Production record {id}")))
    }

    async fn current_weather(&self) -> Option<CurrentConditions> {
        let client = self.weather.as_ref()?;
        let city = self.settings.get().await.default_city;
        match client.fetch_current(&city).await {
            Ok(current) => Some(current),
            Err(e) => {
                warn!("Live weather unavailable for {}: {}, using fallback readings", city, e);
                None
            }
        }
    }

    /// Normalize a production sheet and insert every row
    #[instrument(skip(self, sheet), fields(rows = sheet.len()))]
    pub async fn import_sheet(&self, sheet: &SheetTable) -> Result<ImportSummary, ServiceError> {
        let normalized = normalize_production_sheet(sheet);
        let records = production_rows(&normalized);
        let undated = records.iter().filter(|r| r.date.is_none()).count();
        if undated > 0 {
            debug!("{} imported rows have no usable date", undated);
        }

        let inserted = self.repo.insert_many(&records).await?;
        info!("Imported {} production rows", inserted);
        Ok(ImportSummary {
            rows_read: sheet.len(),
            inserted,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Production record {id}")))
        }
    }
}

/// Explicit readings win over live ones, live ones over the fallbacks
pub fn fill_weather(record: &mut NewProductionRecord, live: Option<&CurrentConditions>) {
    let (temperature, humidity, rainfall) = match live {
        Some(c) => (c.temperature_c, c.humidity_pct, c.rainfall_mm),
        None => (FALLBACK_TEMPERATURE_C, FALLBACK_HUMIDITY_PCT, FALLBACK_RAINFALL_MM),
    };
    record.temperature_c.get_or_insert(temperature);
    record.humidity_pct.get_or_insert(humidity);
    record.rainfall_mm.get_or_insert(rainfall);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_weather_prefers_explicit_values() {
        let mut record = NewProductionRecord {
            temperature_c: Some(18.0),
            ..Default::default()
        };
        let live = CurrentConditions {
            temperature_c: 30.0,
            humidity_pct: 80.0,
            rainfall_mm: 2.5,
        };
        fill_weather(&mut record, Some(&live));
        assert_eq!(record.temperature_c, Some(18.0));
        assert_eq!(record.humidity_pct, Some(80.0));
        assert_eq!(record.rainfall_mm, Some(2.5));
    }

    #[test]
    fn test_fill_weather_fallbacks() {
        let mut record = NewProductionRecord::default();
        fill_weather(&mut record, None);
        assert_eq!(record.temperature_c, Some(FALLBACK_TEMPERATURE_C));
        assert_eq!(record.humidity_pct, Some(FALLBACK_HUMIDITY_PCT));
        assert_eq!(record.rainfall_mm, Some(FALLBACK_RAINFALL_MM));
    }
}
