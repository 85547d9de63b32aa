//! Read-side aggregation over production and supply records.
//!
//! Everything here is a pure function of the records handed in and the
//! active [`ReportFilter`]. Nothing is cached; callers re-read the tables and
//! recompute on every request.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::agronomy::{self, round_to, Advisory, SanitaryAlert};
use crate::db::{ProductionRecord, SupplyRecord};

/// Second-grade boxes are valued at this fraction of the box price
pub const GRADE2_PRICE_FACTOR: f64 = 0.5;

pub const TOP_AREAS: usize = 5;
const LATEST_CLIMATE_ADVISORIES: usize = 3;
const LATEST_SANITARY_ALERTS: usize = 2;
const FUNGAL_RISK_HUMIDITY: f64 = 85.0;
const COLD_DAMAGE_TEMPERATURE: f64 = 10.0;

/// Inclusive date window plus multi-select filters; an empty list selects all
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub supply_types: Vec<String>,
}

impl ReportFilter {
    fn has_window(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Undated records never fall inside an explicit window
    fn in_window(&self, date: Option<NaiveDate>) -> bool {
        if !self.has_window() {
            return true;
        }
        match date {
            Some(d) => self.from.map_or(true, |from| d >= from) && self.to.map_or(true, |to| d <= to),
            None => false,
        }
    }

    fn selects(options: &[String], value: &str) -> bool {
        options.is_empty() || options.iter().any(|o| o == value)
    }

    pub fn production(&self, records: &[ProductionRecord]) -> Vec<ProductionRecord> {
        records
            .iter()
            .filter(|r| self.in_window(r.date))
            .filter(|r| Self::selects(&self.areas, &r.area))
            .filter(|r| Self::selects(&self.crops, &r.crop))
            .cloned()
            .collect()
    }

    pub fn supplies(&self, records: &[SupplyRecord]) -> Vec<SupplyRecord> {
        records
            .iter()
            .filter(|r| self.in_window(r.date))
            .filter(|r| Self::selects(&self.supply_types, &r.supply_type))
            .cloned()
            .collect()
    }

    /// Supply filter for the purchase history, which also narrows by area and
    /// crop. A purchase without a crop only passes when no crop is selected.
    pub fn supply_history(&self, records: &[SupplyRecord]) -> Vec<SupplyRecord> {
        self.supplies(records)
            .into_iter()
            .filter(|r| Self::selects(&self.areas, &r.area))
            .filter(|r| Self::selects(&self.crops, r.crop.as_deref().unwrap_or("")))
            .collect()
    }
}

/// `g2 / (g1 + g2) * 100`, 0 when both are 0
pub fn grade2_pct(grade1: i64, grade2: i64) -> f64 {
    let total = grade1 + grade2;
    if total <= 0 {
        0.0
    } else {
        grade2 as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Kpis {
    pub total_grade1: i64,
    pub total_grade2: i64,
    pub total_supply_cost: f64,
    pub estimated_revenue: f64,
    pub estimated_profit: f64,
}

pub fn kpis(production: &[ProductionRecord], supplies: &[SupplyRecord], box_price: f64) -> Kpis {
    let total_grade1: i64 = production.iter().map(|r| r.boxes_grade1).sum();
    let total_grade2: i64 = production.iter().map(|r| r.boxes_grade2).sum();
    let total_supply_cost: f64 = supplies.iter().map(|s| s.total_cost).sum();
    let estimated_revenue = total_grade1 as f64 * box_price;

    Kpis {
        total_grade1,
        total_grade2,
        total_supply_cost: round_to(total_supply_cost, 2),
        estimated_revenue: round_to(estimated_revenue, 2),
        estimated_profit: round_to(estimated_revenue - total_supply_cost, 2),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Grade2Summary {
    /// Mean of the per-record percentages
    pub mean_pct: f64,
    pub threshold: f64,
    pub alert: bool,
}

pub fn grade2_summary(production: &[ProductionRecord], threshold: f64) -> Grade2Summary {
    let mean_pct = if production.is_empty() {
        0.0
    } else {
        let sum: f64 = production
            .iter()
            .map(|r| grade2_pct(r.boxes_grade1, r.boxes_grade2))
            .sum();
        sum / production.len() as f64
    };

    Grade2Summary {
        mean_pct: round_to(mean_pct, 1),
        threshold,
        alert: mean_pct > threshold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Area,
    Crop,
    SupplyType,
    Month,
}

fn month_key(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductionTotal {
    pub key: String,
    pub grade1: i64,
    pub grade2: i64,
}

/// Grade-1/grade-2 sums per key, ordered by key. `SupplyType` is not a
/// production column and yields nothing; undated rows are left out of months.
pub fn production_totals(records: &[ProductionRecord], by: GroupBy) -> Vec<ProductionTotal> {
    let mut groups: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for record in records {
        let key = match by {
            GroupBy::Area => Some(record.area.clone()),
            GroupBy::Crop => Some(record.crop.clone()),
            GroupBy::Month => month_key(record.date),
            GroupBy::SupplyType => None,
        };
        if let Some(key) = key {
            let entry = groups.entry(key).or_default();
            entry.0 += record.boxes_grade1;
            entry.1 += record.boxes_grade2;
        }
    }

    groups
        .into_iter()
        .map(|(key, (grade1, grade2))| ProductionTotal { key, grade1, grade2 })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CostTotal {
    pub key: String,
    pub total_cost: f64,
}

/// Supply cost sums per key, ordered by key. Rows without a crop are left
/// out of the crop grouping.
pub fn supply_totals(records: &[SupplyRecord], by: GroupBy) -> Vec<CostTotal> {
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        let key = match by {
            GroupBy::Area => Some(record.area.clone()),
            GroupBy::Crop => record.crop.clone(),
            GroupBy::SupplyType => Some(record.supply_type.clone()),
            GroupBy::Month => month_key(record.date),
        };
        if let Some(key) = key {
            *groups.entry(key).or_default() += record.total_cost;
        }
    }

    groups
        .into_iter()
        .map(|(key, total)| CostTotal {
            key,
            total_cost: round_to(total, 2),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyProduction {
    pub date: NaiveDate,
    pub grade1: i64,
    pub grade2: i64,
}

pub fn daily_series(records: &[ProductionRecord]) -> Vec<DailyProduction> {
    let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.date {
            let entry = days.entry(date).or_default();
            entry.0 += record.boxes_grade1;
            entry.1 += record.boxes_grade2;
        }
    }
    days.into_iter()
        .map(|(date, (grade1, grade2))| DailyProduction { date, grade1, grade2 })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CropQuality {
    pub crop: String,
    pub grade1: i64,
    pub grade2: i64,
    pub grade2_pct: f64,
}

pub fn crop_quality(records: &[ProductionRecord]) -> Vec<CropQuality> {
    production_totals(records, GroupBy::Crop)
        .into_iter()
        .map(|t| CropQuality {
            grade2_pct: round_to(grade2_pct(t.grade1, t.grade2), 1),
            crop: t.key,
            grade1: t.grade1,
            grade2: t.grade2,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AreaProductivity {
    pub area: String,
    pub grade1: i64,
    pub grade2: i64,
    /// Grade-1 boxes divided by the distinct dates of the whole filtered set
    pub mean_daily_grade1: f64,
}

pub fn area_productivity(records: &[ProductionRecord]) -> Vec<AreaProductivity> {
    let distinct_days = records
        .iter()
        .filter_map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .len();

    production_totals(records, GroupBy::Area)
        .into_iter()
        .map(|t| AreaProductivity {
            mean_daily_grade1: if distinct_days == 0 {
                0.0
            } else {
                round_to(t.grade1 as f64 / distinct_days as f64, 2)
            },
            area: t.key,
            grade1: t.grade1,
            grade2: t.grade2,
        })
        .collect()
}

/// Areas with the most grade-1 boxes, best first; ties keep key order
pub fn top_areas(records: &[ProductionRecord], limit: usize) -> Vec<ProductionTotal> {
    let mut totals = production_totals(records, GroupBy::Area);
    totals.sort_by(|a, b| b.grade1.cmp(&a.grade1));
    totals.truncate(limit);
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplyCostStats {
    pub record_count: usize,
    pub total_cost: f64,
    pub mean_cost: f64,
}

pub fn supply_cost_stats(records: &[SupplyRecord]) -> SupplyCostStats {
    let total: f64 = records.iter().map(|r| r.total_cost).sum();
    let mean = if records.is_empty() {
        0.0
    } else {
        total / records.len() as f64
    };
    SupplyCostStats {
        record_count: records.len(),
        total_cost: round_to(total, 2),
        mean_cost: round_to(mean, 2),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplyHistory {
    pub records: Vec<SupplyRecord>,
    pub stats: SupplyCostStats,
}

pub fn supply_history(records: &[SupplyRecord], filter: &ReportFilter) -> SupplyHistory {
    let records = filter.supply_history(records);
    let stats = supply_cost_stats(&records);
    SupplyHistory { records, stats }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CropProfitability {
    pub crop: String,
    pub grade1: i64,
    pub grade2: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    /// `None` when the matched cost is zero
    pub roi_pct: Option<f64>,
}

/// Revenue, cost and ROI for crops present in both tables, ordered by crop
pub fn profitability(
    production: &[ProductionRecord],
    supplies: &[SupplyRecord],
    box_price: f64,
) -> Vec<CropProfitability> {
    let produced: HashMap<String, (i64, i64)> = production_totals(production, GroupBy::Crop)
        .into_iter()
        .map(|t| (t.key, (t.grade1, t.grade2)))
        .collect();

    let mut costs: BTreeMap<String, f64> = BTreeMap::new();
    for supply in supplies {
        if let Some(crop) = &supply.crop {
            *costs.entry(crop.clone()).or_default() += supply.total_cost;
        }
    }

    costs
        .into_iter()
        .filter_map(|(crop, cost)| {
            let (grade1, grade2) = *produced.get(&crop)?;
            let revenue =
                grade1 as f64 * box_price + grade2 as f64 * box_price * GRADE2_PRICE_FACTOR;
            let profit = revenue - cost;
            let roi_pct = (cost != 0.0).then(|| round_to(profit / cost * 100.0, 1));
            Some(CropProfitability {
                crop,
                grade1,
                grade2,
                revenue: round_to(revenue, 2),
                cost: round_to(cost, 2),
                profit: round_to(profit, 2),
                roi_pct,
            })
        })
        .collect()
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where a column has no variance
    pub values: Vec<Vec<Option<f64>>>,
}

pub const CORRELATION_COLUMNS: [&str; 4] =
    ["boxes_grade1", "temperature_c", "humidity_pct", "rainfall_mm"];

/// Pearson correlation of grade-1 output against the weather readings;
/// `None` with fewer than two records
pub fn correlation_matrix(records: &[ProductionRecord]) -> Option<CorrelationMatrix> {
    if records.len() < 2 {
        return None;
    }
    let series: [Vec<f64>; 4] = [
        records.iter().map(|r| r.boxes_grade1 as f64).collect(),
        records.iter().map(|r| r.temperature_c).collect(),
        records.iter().map(|r| r.humidity_pct).collect(),
        records.iter().map(|r| r.rainfall_mm).collect(),
    ];

    let values = series
        .iter()
        .map(|x| {
            series
                .iter()
                .map(|y| pearson(x, y).map(|r| round_to(r, 4)))
                .collect()
        })
        .collect();

    Some(CorrelationMatrix {
        columns: CORRELATION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionAlertKind {
    FungalRisk,
    ColdDamage,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConditionAlert {
    pub kind: ConditionAlertKind,
    pub message: String,
}

/// Alerts raised by the readings of the latest production entry
pub fn condition_alerts(latest: &ProductionRecord) -> Vec<ConditionAlert> {
    let mut alerts = Vec::new();
    if latest.humidity_pct > FUNGAL_RISK_HUMIDITY {
        alerts.push(ConditionAlert {
            kind: ConditionAlertKind::FungalRisk,
            message: "Humidity is very high, risk of fungal disease".to_string(),
        });
    }
    if latest.temperature_c < COLD_DAMAGE_TEMPERATURE {
        alerts.push(ConditionAlert {
            kind: ConditionAlertKind::ColdDamage,
            message: "Temperature is very low, risk of plant damage".to_string(),
        });
    }
    alerts
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LatestAdvisories {
    pub crop: String,
    pub climate: Vec<Advisory>,
    pub sanitary: Vec<SanitaryAlert>,
}

/// Agronomic advisories for the crop of the latest entry; `None` for crops
/// outside the profile table
pub fn latest_advisories(latest: &ProductionRecord) -> Option<LatestAdvisories> {
    let profile = agronomy::profile(&latest.crop)?;
    let mut climate =
        agronomy::climate_advisories(profile.name, latest.temperature_c, latest.humidity_pct);
    climate.truncate(LATEST_CLIMATE_ADVISORIES);
    let mut sanitary =
        agronomy::sanitary_alerts(profile.name, latest.temperature_c, latest.humidity_pct);
    sanitary.truncate(LATEST_SANITARY_ALERTS);

    Some(LatestAdvisories {
        crop: profile.name.to_string(),
        climate,
        sanitary,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    MostProfitableCrop,
    Grade2Alert,
    LowestYieldArea,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

/// Best ROI crop, grade-2 alert and the weakest area by mean grade-1 per entry
pub fn strategic_insights(
    production: &[ProductionRecord],
    profitability: &[CropProfitability],
    grade2: &Grade2Summary,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let best = profitability
        .iter()
        .filter_map(|p| p.roi_pct.map(|roi| (p, roi)))
        .fold(None::<(&CropProfitability, f64)>, |best, (p, roi)| match best {
            Some((_, best_roi)) if best_roi >= roi => best,
            _ => Some((p, roi)),
        });
    if let Some((crop, roi)) = best {
        insights.push(Insight {
            kind: InsightKind::MostProfitableCrop,
            message: format!("{} is the most profitable crop (ROI: {}%)", crop.crop, roi),
        });
    }

    if grade2.alert {
        insights.push(Insight {
            kind: InsightKind::Grade2Alert,
            message: format!(
                "Second-grade share ({:.1}%) is above the {:.1}% limit",
                grade2.mean_pct, grade2.threshold
            ),
        });
    }

    let mut per_area: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for record in production {
        let entry = per_area.entry(record.area.as_str()).or_default();
        entry.0 += record.boxes_grade1;
        entry.1 += 1;
    }
    let lowest = per_area
        .into_iter()
        .map(|(area, (sum, count))| (area, sum as f64 / count as f64))
        .fold(None::<(&str, f64)>, |low, (area, mean)| match low {
            Some((_, low_mean)) if low_mean <= mean => low,
            _ => Some((area, mean)),
        });
    if let Some((area, mean)) = lowest {
        insights.push(Insight {
            kind: InsightKind::LowestYieldArea,
            message: format!("Area {area} has the lowest mean output ({mean:.1} boxes per entry)"),
        });
    }

    insights
}

/// Everything the analysis view shows for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalysisReport {
    pub production_count: usize,
    pub supply_count: usize,
    pub kpis: Kpis,
    pub grade2: Grade2Summary,
    pub daily: Vec<DailyProduction>,
    pub monthly_production: Vec<ProductionTotal>,
    pub production_by_area: Vec<AreaProductivity>,
    pub production_by_crop: Vec<CropQuality>,
    pub top_areas: Vec<ProductionTotal>,
    pub supply_stats: SupplyCostStats,
    pub cost_by_supply_type: Vec<CostTotal>,
    pub cost_by_crop: Vec<CostTotal>,
    pub cost_by_area: Vec<CostTotal>,
    pub monthly_cost: Vec<CostTotal>,
    pub profitability: Vec<CropProfitability>,
    pub correlation: Option<CorrelationMatrix>,
    pub insights: Vec<Insight>,
}

pub fn analysis_report(
    production: &[ProductionRecord],
    supplies: &[SupplyRecord],
    filter: &ReportFilter,
    box_price: f64,
    grade2_threshold: f64,
) -> AnalysisReport {
    let production = filter.production(production);
    let supplies = filter.supplies(supplies);

    let grade2 = grade2_summary(&production, grade2_threshold);
    let profitability = profitability(&production, &supplies, box_price);
    let insights = strategic_insights(&production, &profitability, &grade2);

    AnalysisReport {
        production_count: production.len(),
        supply_count: supplies.len(),
        kpis: kpis(&production, &supplies, box_price),
        daily: daily_series(&production),
        monthly_production: production_totals(&production, GroupBy::Month),
        production_by_area: area_productivity(&production),
        production_by_crop: crop_quality(&production),
        top_areas: top_areas(&production, TOP_AREAS),
        supply_stats: supply_cost_stats(&supplies),
        cost_by_supply_type: supply_totals(&supplies, GroupBy::SupplyType),
        cost_by_crop: supply_totals(&supplies, GroupBy::Crop),
        cost_by_area: supply_totals(&supplies, GroupBy::Area),
        monthly_cost: supply_totals(&supplies, GroupBy::Month),
        correlation: correlation_matrix(&production),
        grade2,
        profitability,
        insights,
    }
}
