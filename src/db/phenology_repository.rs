use std::collections::HashMap;

use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, SpeciesPhenology};
use crate::phenology::Stage;

#[derive(FromRow)]
struct SpeciesRow {
    species: String,
    stages: String,
}

impl SpeciesRow {
    /// Undecodable stage JSON loads as an empty list
    fn decode(self) -> SpeciesPhenology {
        let stages = match serde_json::from_str::<Vec<Stage>>(&self.stages) {
            Ok(stages) => stages,
            Err(e) => {
                warn!("Stored stages for species '{}' are not valid: {}", self.species, e);
                Vec::new()
            }
        };
        SpeciesPhenology {
            species: self.species,
            stages,
        }
    }
}

#[derive(Clone)]
pub struct PhenologyRepository {
    pool: SqlitePool,
}

impl PhenologyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the stage set of one species
    #[instrument(skip(self, stages), fields(stage_count = stages.len()))]
    pub async fn upsert(&self, species: &str, stages: &[Stage]) -> Result<(), DbError> {
        let json = serde_json::to_string(stages)?;

        sqlx::query(
            r#"
            INSERT INTO species_phenology (species, stages, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT (species) DO UPDATE SET
                stages = excluded.stages,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(species)
        .bind(json)
        .execute(&self.pool)
        .await?;

        info!("Saved {} stages for species '{}'", stages.len(), species);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find(&self, species: &str) -> Result<Option<SpeciesPhenology>, DbError> {
        let row = sqlx::query_as::<_, SpeciesRow>(
            "SELECT species, stages FROM species_phenology WHERE species = ?",
        )
        .bind(species)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SpeciesRow::decode))
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<SpeciesPhenology>, DbError> {
        let rows = sqlx::query_as::<_, SpeciesRow>(
            "SELECT species, stages FROM species_phenology ORDER BY species",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} species overrides", rows.len());
        Ok(rows.into_iter().map(SpeciesRow::decode).collect())
    }

    /// Overrides keyed by species name
    pub async fn load_map(&self) -> Result<HashMap<String, Vec<Stage>>, DbError> {
        let all = self.find_all().await?;
        Ok(all.into_iter().map(|s| (s.species, s.stages)).collect())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, species: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM species_phenology WHERE species = ?")
            .bind(species)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
