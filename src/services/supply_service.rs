use tracing::{info, instrument};

use crate::db::{DbError, ImportSummary, NewSupplyRecord, SupplyRecord, SupplyRepository};
use crate::importers::{normalize_supply_sheet, supply_rows, SheetTable};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct SupplyService {
    repo: SupplyRepository,
}

impl SupplyService {
    pub fn new(repo: SupplyRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<SupplyRecord>, DbError> {
        self.repo.find_all().await
    }

    #[instrument(skip(self, record), fields(supply_type = record.supply_type.label()))]
    pub async fn add(&self, record: NewSupplyRecord) -> Result<SupplyRecord, ServiceError> {
        let record = prepare(record)?;
        let id = self.repo.insert(&record).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supply record {id}")))
    }

    #[instrument(skip(self, sheet), fields(rows = sheet.len()))]
    pub async fn import_sheet(&self, sheet: &SheetTable) -> Result<ImportSummary, ServiceError> {
        let normalized = normalize_supply_sheet(sheet);
        let records = supply_rows(&normalized)
            .into_iter()
            .map(prepare)
            .collect::<Result<Vec<_>, _>>()?;

        let inserted = self.repo.insert_many(&records).await?;
        info!("Imported {} supply rows", inserted);
        Ok(ImportSummary {
            rows_read: sheet.len(),
            inserted,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Supply record {id}")))
        }
    }
}

/// Reject negative amounts and derive `total_cost` when it is zero
pub fn prepare(mut record: NewSupplyRecord) -> Result<NewSupplyRecord, ServiceError> {
    for (field, value) in [
        ("quantity", record.quantity),
        ("unit_cost", record.unit_cost),
        ("total_cost", record.total_cost),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ServiceError::Validation(format!(
                "{field} must be a non-negative number"
            )));
        }
    }

    if record.total_cost == 0.0 {
        record.total_cost = record.quantity * record.unit_cost;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SupplyType, Unit};

    fn record(quantity: f64, unit_cost: f64, total_cost: f64) -> NewSupplyRecord {
        NewSupplyRecord {
            date: None,
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

    #[test]
    fn test_zero_total_is_recomputed() {
        let prepared = prepare(record(10.0, 4.0, 0.0)).unwrap();
        assert_eq!(prepared.total_cost, 40.0);
    }

    #[test]
    fn test_explicit_total_is_kept() {
        let prepared = prepare(record(10.0, 4.0, 35.0)).unwrap();
        assert_eq!(prepared.total_cost, 35.0);
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        assert!(matches!(
            prepare(record(-1.0, 4.0, 0.0)),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            prepare(record(1.0, f64::NAN, 0.0)),
            Err(ServiceError::Validation(_))
        ));
    }
}
