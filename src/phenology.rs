//! Growth-stage lookup from planting dates.
//!
//! A stage table is an ordered list of [`Stage`]s, each covering an inclusive
//! `"lo-hi"` range of days since planting. Species may carry their own table;
//! everything else uses the default set from the settings document.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

pub const HARVEST_COMPLETE: &str = "Harvest complete";
pub const NO_SPECIFIC_RECOMMENDATION: &str = "No specific recommendation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Stage {
    #[serde(alias = "nome")]
    pub name: String,
    /// Inclusive day range since planting, written as `"lo-hi"`
    #[serde(alias = "dias")]
    pub days: String,
    /// Fertilizer dose in kg/ha
    #[serde(alias = "adubo", default)]
    pub fertilizer: f64,
    /// Water dose in L/plant
    #[serde(alias = "agua", default)]
    pub water: f64,
}

impl Stage {
    pub fn new(name: &str, days: &str, fertilizer: f64, water: f64) -> Self {
        Self {
            name: name.to_string(),
            days: days.to_string(),
            fertilizer,
            water,
        }
    }

    /// Parse the day range; `None` unless it is exactly two integers
    pub fn day_bounds(&self) -> Option<(i64, i64)> {
        let parts: Vec<&str> = self.days.split('-').collect();
        if parts.len() != 2 {
            return None;
        }
        let lo = parts[0].trim().parse::<i64>().ok()?;
        let hi = parts[1].trim().parse::<i64>().ok()?;
        Some((lo, hi))
    }

    fn covers(&self, elapsed_days: i64) -> bool {
        match self.day_bounds() {
            Some((lo, hi)) => lo <= elapsed_days && elapsed_days <= hi,
            None => {
                debug!("Skipping stage '{}' with malformed range '{}'", self.name, self.days);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StageSet {
    #[serde(alias = "estagios", default)]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhenologyError {
    #[error("Not specified")]
    NoDate,
    #[error("Invalid date")]
    InvalidDate(String),
}

/// Outcome of a successful stage lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    InStage { name: String, elapsed_days: i64 },
    /// No stage covers the elapsed days (past the last range, or every range malformed)
    HarvestComplete { elapsed_days: i64 },
}

impl StageStatus {
    pub fn label(&self) -> &str {
        match self {
            StageStatus::InStage { name, .. } => name,
            StageStatus::HarvestComplete { .. } => HARVEST_COMPLETE,
        }
    }

    pub fn elapsed_days(&self) -> i64 {
        match self {
            StageStatus::InStage { elapsed_days, .. }
            | StageStatus::HarvestComplete { elapsed_days } => *elapsed_days,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DoseRecommendation {
    Specific {
        fertilizer_kg_ha: f64,
        water_l_per_plant: f64,
    },
    NoSpecificRecommendation,
}

impl DoseRecommendation {
    pub fn message(&self) -> String {
        match self {
            DoseRecommendation::Specific {
                fertilizer_kg_ha,
                water_l_per_plant,
            } => format!(
                "Recommended: {fertilizer_kg_ha}kg/ha of fertilizer and {water_l_per_plant}L/plant of water"
            ),
            DoseRecommendation::NoSpecificRecommendation => NO_SPECIFIC_RECOMMENDATION.to_string(),
        }
    }
}

/// Map elapsed days since `planting_date` to a stage of `stages`.
///
/// `planting_date` must be `YYYY-MM-DD`. The first stage whose range covers
/// the elapsed days wins; ranges are not checked for overlap.
pub fn stage_for(
    planting_date: Option<&str>,
    stages: &[Stage],
    today: NaiveDate,
) -> Result<StageStatus, PhenologyError> {
    let raw = match planting_date.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(PhenologyError::NoDate),
    };

    let planted = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| PhenologyError::InvalidDate(raw.to_string()))?;
    let elapsed_days = (today - planted).num_days();

    let status = stages
        .iter()
        .find(|stage| stage.covers(elapsed_days))
        .map(|stage| StageStatus::InStage {
            name: stage.name.clone(),
            elapsed_days,
        })
        .unwrap_or(StageStatus::HarvestComplete { elapsed_days });

    Ok(status)
}

/// Dose of the first stage named `stage_name`
pub fn dose_for(stage_name: &str, stages: &[Stage]) -> DoseRecommendation {
    stages
        .iter()
        .find(|stage| stage.name == stage_name)
        .map(|stage| DoseRecommendation::Specific {
            fertilizer_kg_ha: stage.fertilizer,
            water_l_per_plant: stage.water,
        })
        .unwrap_or(DoseRecommendation::NoSpecificRecommendation)
}

/// Default stage set plus the per-species overrides currently persisted
#[derive(Debug, Clone, Default)]
pub struct PhenologyTable {
    default_stages: StageSet,
    species: HashMap<String, Vec<Stage>>,
}

impl PhenologyTable {
    pub fn new(default_stages: StageSet, species: HashMap<String, Vec<Stage>>) -> Self {
        Self {
            default_stages,
            species,
        }
    }

    /// Stage table for `species`, falling back to the default set
    pub fn stages(&self, species: Option<&str>) -> &[Stage] {
        match species.and_then(|s| self.species.get(s)) {
            Some(stages) => stages,
            None => {
                if let Some(name) = species {
                    if !name.is_empty() {
                        warn!("No phenology override for species '{}', using defaults", name);
                    }
                }
                &self.default_stages.stages
            }
        }
    }

    pub fn stage_for(
        &self,
        planting_date: Option<&str>,
        species: Option<&str>,
        today: NaiveDate,
    ) -> Result<StageStatus, PhenologyError> {
        stage_for(planting_date, self.stages(species), today)
    }

    pub fn dose_for(&self, stage_name: &str, species: Option<&str>) -> DoseRecommendation {
        dose_for(stage_name, self.stages(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn default_table() -> PhenologyTable {
        PhenologyTable::new(Settings::default().default_phenology, HashMap::new())
    }

    fn days_before(days: i64) -> String {
        (today() - chrono::Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn test_stage_100_days_after_planting_is_maturation() {
        let planted = days_before(100);
        let status = default_table()
            .stage_for(Some(&planted), None, today())
            .unwrap();
        assert_eq!(status.label(), "Maturação");
        assert_eq!(status.elapsed_days(), 100);
    }

    #[test]
    fn test_stage_is_constant_within_bounds() {
        let table = default_table();
        for days in 31..=60 {
            let planted = days_before(days);
            let status = table.stage_for(Some(&planted), None, today()).unwrap();
            assert_eq!(status.label(), "Floração", "day {days}");
        }
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let table = default_table();
        assert_eq!(
            table.stage_for(Some(&days_before(0)), None, today()).unwrap().label(),
            "Germinação/Vegetativo"
        );
        assert_eq!(
            table.stage_for(Some(&days_before(30)), None, today()).unwrap().label(),
            "Germinação/Vegetativo"
        );
        assert_eq!(
            table.stage_for(Some(&days_before(120)), None, today()).unwrap().label(),
            "Maturação"
        );
    }

    #[test]
    fn test_past_last_range_is_harvest_complete() {
        let table = default_table();
        for days in [121, 200, 5000] {
            let status = table
                .stage_for(Some(&days_before(days)), None, today())
                .unwrap();
            assert_eq!(status, StageStatus::HarvestComplete { elapsed_days: days });
            assert_eq!(status.to_string(), HARVEST_COMPLETE);
        }
    }

    #[test]
    fn test_missing_and_invalid_dates() {
        let table = default_table();
        assert_eq!(
            table.stage_for(None, None, today()),
            Err(PhenologyError::NoDate)
        );
        assert_eq!(
            table.stage_for(Some("  "), None, today()),
            Err(PhenologyError::NoDate)
        );
        let err = table.stage_for(Some("30/06/2025"), None, today()).unwrap_err();
        assert_eq!(err, PhenologyError::InvalidDate("30/06/2025".to_string()));
        assert_eq!(err.to_string(), "Invalid date");
        assert_eq!(PhenologyError::NoDate.to_string(), "Not specified");
    }

    #[test]
    fn test_malformed_ranges_are_skipped() {
        let stages = vec![
            Stage::new("Broken", "ten-twenty", 1.0, 1.0),
            Stage::new("Also broken", "0-10-20", 1.0, 1.0),
            Stage::new("Good", "0-20", 2.0, 2.0),
        ];
        let status = stage_for(Some(&days_before(5)), &stages, today()).unwrap();
        assert_eq!(status.label(), "Good");

        let only_broken = vec![Stage::new("Broken", "x", 1.0, 1.0)];
        let status = stage_for(Some(&days_before(5)), &only_broken, today()).unwrap();
        assert_eq!(status, StageStatus::HarvestComplete { elapsed_days: 5 });
    }

    #[test]
    fn test_species_override_takes_precedence() {
        let mut species = HashMap::new();
        species.insert(
            "Tomato".to_string(),
            vec![
                Stage::new("Seedling", "0-20", 1.0, 0.5),
                Stage::new("Harvest", "21-150", 5.0, 3.0),
            ],
        );
        let table = PhenologyTable::new(Settings::default().default_phenology, species);

        let planted = days_before(130);
        assert_eq!(
            table.stage_for(Some(&planted), Some("Tomato"), today()).unwrap().label(),
            "Harvest"
        );
        // Unknown species uses the default set
        assert_eq!(
            table.stage_for(Some(&planted), Some("Okra"), today()).unwrap().label(),
            HARVEST_COMPLETE
        );
    }

    #[test]
    fn test_dose_for_known_and_unknown_stage() {
        let table = default_table();
        assert_eq!(
            table.dose_for("Floração", None),
            DoseRecommendation::Specific {
                fertilizer_kg_ha: 4.0,
                water_l_per_plant: 2.0
            }
        );
        assert_eq!(
            table.dose_for("Dormancy", None),
            DoseRecommendation::NoSpecificRecommendation
        );
        assert_eq!(
            DoseRecommendation::NoSpecificRecommendation.message(),
            NO_SPECIFIC_RECOMMENDATION
        );
    }

    #[test]
    fn test_day_bounds_parsing() {
        assert_eq!(Stage::new("a", "0-30", 0.0, 0.0).day_bounds(), Some((0, 30)));
        assert_eq!(Stage::new("a", " 31 - 60 ", 0.0, 0.0).day_bounds(), Some((31, 60)));
        assert_eq!(Stage::new("a", "0-0", 0.0, 0.0).day_bounds(), Some((0, 0)));
        assert_eq!(Stage::new("a", "30", 0.0, 0.0).day_bounds(), None);
        assert_eq!(Stage::new("a", "", 0.0, 0.0).day_bounds(), None);
    }
}
