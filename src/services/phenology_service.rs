use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::db::{DbError, PhenologyRepository, SpeciesPhenology};
use crate::phenology::{DoseRecommendation, PhenologyError, PhenologyTable, Stage, StageStatus};
use crate::services::{ServiceError, SettingsService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    InStage,
    HarvestComplete,
    NoDate,
    InvalidDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StageLookup {
    pub outcome: StageOutcome,
    /// Stage name, or the display text for the other outcomes
    pub label: String,
    pub elapsed_days: Option<i64>,
}

impl From<Result<StageStatus, PhenologyError>> for StageLookup {
    fn from(result: Result<StageStatus, PhenologyError>) -> Self {
        let outcome = match &result {
            Ok(StageStatus::InStage { .. }) => StageOutcome::InStage,
            Ok(StageStatus::HarvestComplete { .. }) => StageOutcome::HarvestComplete,
            Err(PhenologyError::NoDate) => StageOutcome::NoDate,
            Err(PhenologyError::InvalidDate(_)) => StageOutcome::InvalidDate,
        };
        match result {
            Ok(status) => Self {
                outcome,
                label: status.label().to_string(),
                elapsed_days: Some(status.elapsed_days()),
            },
            Err(e) => Self {
                outcome,
                label: e.to_string(),
                elapsed_days: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DoseLookup {
    pub stage: String,
    pub fertilizer_kg_ha: Option<f64>,
    pub water_l_per_plant: Option<f64>,
    pub message: String,
}

impl DoseLookup {
    fn new(stage: &str, dose: DoseRecommendation) -> Self {
        let message = dose.message();
        let (fertilizer_kg_ha, water_l_per_plant) = match dose {
            DoseRecommendation::Specific {
                fertilizer_kg_ha,
                water_l_per_plant,
            } => (Some(fertilizer_kg_ha), Some(water_l_per_plant)),
            DoseRecommendation::NoSpecificRecommendation => (None, None),
        };
        Self {
            stage: stage.to_string(),
            fertilizer_kg_ha,
            water_l_per_plant,
            message,
        }
    }
}

#[derive(Clone)]
pub struct PhenologyService {
    repo: PhenologyRepository,
    settings: SettingsService,
}

impl PhenologyService {
    pub fn new(repo: PhenologyRepository, settings: SettingsService) -> Self {
        Self { repo, settings }
    }

    /// Default stages from the settings document plus persisted overrides
    pub async fn table(&self) -> Result<PhenologyTable, DbError> {
        let defaults = self.settings.get().await.default_phenology;
        let overrides = self.repo.load_map().await?;
        debug!("Phenology table with {} species overrides", overrides.len());
        Ok(PhenologyTable::new(defaults, overrides))
    }

    #[instrument(skip(self))]
    pub async fn stage(
        &self,
        planting_date: Option<&str>,
        species: Option<&str>,
        today: NaiveDate,
    ) -> Result<StageLookup, DbError> {
        let table = self.table().await?;
        Ok(table.stage_for(planting_date, species, today).into())
    }

    #[instrument(skip(self))]
    pub async fn dose(&self, stage: &str, species: Option<&str>) -> Result<DoseLookup, DbError> {
        let table = self.table().await?;
        Ok(DoseLookup::new(stage, table.dose_for(stage, species)))
    }

    pub async fn list_species(&self) -> Result<Vec<SpeciesPhenology>, DbError> {
        self.repo.find_all().await
    }

    pub async fn get_species(&self, species: &str) -> Result<SpeciesPhenology, ServiceError> {
        self.repo
            .find(species)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Species {species}")))
    }

    /// Save a species override; without explicit stages the default set is copied
    #[instrument(skip(self, stages))]
    pub async fn save_species(
        &self,
        species: &str,
        stages: Option<Vec<Stage>>,
    ) -> Result<SpeciesPhenology, ServiceError> {
        let species = species.trim();
        if species.is_empty() {
            return Err(ServiceError::Validation("species must not be empty".to_string()));
        }

        let stages = match stages {
            Some(stages) => stages,
            None => {
                info!("No stages given for {}, copying the default set", species);
                self.settings.get().await.default_phenology.stages
            }
        };

        self.repo.upsert(species, &stages).await?;
        Ok(SpeciesPhenology {
            species: species.to_string(),
            stages,
        })
    }

    pub async fn delete_species(&self, species: &str) -> Result<(), ServiceError> {
        if self.repo.delete(species).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Species {species}")))
        }
    }
}
