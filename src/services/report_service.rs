use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::analytics::{
    self, condition_alerts, crop_quality, grade2_summary, kpis, latest_advisories,
    production_totals, AnalysisReport, ConditionAlert, CropQuality, Grade2Summary, GroupBy, Kpis,
    LatestAdvisories, ProductionTotal, ReportFilter, SupplyHistory,
};
use crate::db::{CostRepository, DbError, ProductionRecord, ProductionRepository, SupplyRepository};
use crate::importers::to_csv_string;
use crate::services::{ServiceError, SettingsService};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub grade2: Grade2Summary,
    pub production_by_area: Vec<ProductionTotal>,
    pub production_by_crop: Vec<CropQuality>,
    pub latest: Option<ProductionRecord>,
    pub condition_alerts: Vec<ConditionAlert>,
    pub advisories: Option<LatestAdvisories>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Production,
    Supplies,
    Costs,
}

#[derive(Clone)]
pub struct ReportService {
    production_repo: ProductionRepository,
    supply_repo: SupplyRepository,
    cost_repo: CostRepository,
    settings: SettingsService,
}

impl ReportService {
    pub fn new(
        production_repo: ProductionRepository,
        supply_repo: SupplyRepository,
        cost_repo: CostRepository,
        settings: SettingsService,
    ) -> Self {
        Self {
            production_repo,
            supply_repo,
            cost_repo,
            settings,
        }
    }

    /// Unfiltered KPIs plus alerts and advisories for the latest entry
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, DbError> {
        let settings = self.settings.get().await;
        let production = self.production_repo.find_all().await?;
        let supplies = self.supply_repo.find_all().await?;
        let latest = self.production_repo.find_latest().await?;

        let (alerts, advisories) = match &latest {
            Some(record) => (condition_alerts(record), latest_advisories(record)),
            None => (Vec::new(), None),
        };
        debug!(
            "Dashboard over {} production and {} supply records",
            production.len(),
            supplies.len()
        );

        Ok(Dashboard {
            kpis: kpis(&production, &supplies, settings.average_box_price),
            grade2: grade2_summary(&production, settings.grade2_pct_alert_threshold),
            production_by_area: production_totals(&production, GroupBy::Area),
            production_by_crop: crop_quality(&production),
            latest,
            condition_alerts: alerts,
            advisories,
        })
    }

    #[instrument(skip(self))]
    pub async fn analysis(&self, filter: &ReportFilter) -> Result<AnalysisReport, DbError> {
        let settings = self.settings.get().await;
        let production = self.production_repo.find_all().await?;
        let supplies = self.supply_repo.find_all().await?;

        Ok(analytics::analysis_report(
            &production,
            &supplies,
            filter,
            settings.average_box_price,
            settings.grade2_pct_alert_threshold,
        ))
    }

    /// Purchases narrowed by window, area, crop and type, with cost statistics
    #[instrument(skip(self))]
    pub async fn supply_history(&self, filter: &ReportFilter) -> Result<SupplyHistory, DbError> {
        let supplies = self.supply_repo.find_all().await?;
        Ok(analytics::supply_history(&supplies, filter))
    }

    /// Filtered production set as CSV
    pub async fn production_csv(&self, filter: &ReportFilter) -> Result<String, ServiceError> {
        let production = self.production_repo.find_all().await?;
        Ok(to_csv_string(&filter.production(&production))?)
    }

    /// Full dump of one table as CSV
    #[instrument(skip(self))]
    pub async fn table_csv(&self, table: Table) -> Result<String, ServiceError> {
        let csv = match table {
            Table::Production => to_csv_string(&self.production_repo.find_all().await?)?,
            Table::Supplies => to_csv_string(&self.supply_repo.find_all().await?)?,
            Table::Costs => to_csv_string(&self.cost_repo.find_all().await?)?,
        };
        Ok(csv)
    }
}
