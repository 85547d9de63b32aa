//! Static agronomic reference table and the recommendations derived from it.
//!
//! Every function is a pure lookup against [`PROFILES`]; an unknown crop
//! yields `None` or an empty list, never an error.

use serde::Serialize;
use utoipa::ToSchema;

/// Weight of one harvest box in kg
pub const BOX_WEIGHT_KG: f64 = 20.0;

const SQ_METERS_PER_HECTARE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutrients {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgronomicProfile {
    pub name: &'static str,
    /// Name used by the legacy spreadsheets
    pub legacy_name: &'static str,
    /// Plants per hectare
    pub planting_density: f64,
    pub spacing: &'static str,
    pub yield_per_plant_kg: f64,
    pub cycle_days: u32,
    pub ideal_temperature: Band,
    pub ideal_humidity: Band,
    pub ideal_ph: Band,
    /// Baseline N/P/K in kg/ha
    pub baseline: Nutrients,
    pub pests: &'static [&'static str],
    pub diseases: &'static [&'static str],
}

pub static PROFILES: &[AgronomicProfile] = &[
    AgronomicProfile {
        name: "Tomato",
        legacy_name: "Tomate",
        planting_density: 15_000.0,
        spacing: "50x30 cm",
        yield_per_plant_kg: 2.5,
        cycle_days: 90,
        ideal_temperature: Band { min: 18.0, max: 28.0 },
        ideal_humidity: Band { min: 60.0, max: 80.0 },
        ideal_ph: Band { min: 5.5, max: 6.8 },
        baseline: Nutrients { nitrogen: 120.0, phosphorus: 80.0, potassium: 150.0 },
        pests: &["tomato leafminer", "whitefly", "mites"],
        diseases: &["late blight", "bacterial wilt", "powdery mildew"],
    },
    AgronomicProfile {
        name: "Japanese Cucumber",
        legacy_name: "Pepino Japonês",
        planting_density: 18_000.0,
        spacing: "80x40 cm",
        yield_per_plant_kg: 3.2,
        cycle_days: 65,
        ideal_temperature: Band { min: 20.0, max: 30.0 },
        ideal_humidity: Band { min: 65.0, max: 80.0 },
        ideal_ph: Band { min: 5.5, max: 6.5 },
        baseline: Nutrients { nitrogen: 110.0, phosphorus: 60.0, potassium: 140.0 },
        pests: &["whitefly", "mites", "cucumber beetle"],
        diseases: &["powdery mildew", "anthracnose", "viruses"],
    },
    AgronomicProfile {
        name: "Country Cucumber",
        legacy_name: "Pepino Caipira",
        planting_density: 15_000.0,
        spacing: "100x50 cm",
        yield_per_plant_kg: 2.8,
        cycle_days: 70,
        ideal_temperature: Band { min: 18.0, max: 28.0 },
        ideal_humidity: Band { min: 60.0, max: 75.0 },
        ideal_ph: Band { min: 5.8, max: 6.8 },
        baseline: Nutrients { nitrogen: 100.0, phosphorus: 50.0, potassium: 120.0 },
        pests: &["cucumber beetle", "fruit borer", "mites"],
        diseases: &["powdery mildew", "angular leaf spot", "viruses"],
    },
    AgronomicProfile {
        name: "Italian Zucchini",
        legacy_name: "Abóbora Itália",
        planting_density: 8_000.0,
        spacing: "200x100 cm",
        yield_per_plant_kg: 4.5,
        cycle_days: 85,
        ideal_temperature: Band { min: 20.0, max: 30.0 },
        ideal_humidity: Band { min: 60.0, max: 75.0 },
        ideal_ph: Band { min: 6.0, max: 7.0 },
        baseline: Nutrients { nitrogen: 80.0, phosphorus: 50.0, potassium: 100.0 },
        pests: &["cucumber beetle", "fruit borer", "aphids"],
        diseases: &["powdery mildew", "anthracnose", "wilt"],
    },
    AgronomicProfile {
        name: "Menina Squash",
        legacy_name: "Abóbora Menina",
        planting_density: 6_000.0,
        spacing: "250x120 cm",
        yield_per_plant_kg: 6.0,
        cycle_days: 95,
        ideal_temperature: Band { min: 22.0, max: 32.0 },
        ideal_humidity: Band { min: 65.0, max: 80.0 },
        ideal_ph: Band { min: 6.0, max: 7.2 },
        baseline: Nutrients { nitrogen: 70.0, phosphorus: 45.0, potassium: 90.0 },
        pests: &["cucumber beetle", "fruit borer", "aphids"],
        diseases: &["powdery mildew", "anthracnose", "bacterial wilt"],
    },
];

/// Look a crop up by its name or its legacy spreadsheet name
pub fn profile(crop: &str) -> Option<&'static AgronomicProfile> {
    PROFILES
        .iter()
        .find(|p| p.name == crop || p.legacy_name == crop)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn plants_for(profile: &AgronomicProfile, area_m2: f64) -> f64 {
    area_m2 * profile.planting_density / SQ_METERS_PER_HECTARE
}

/// Owned description of a profile for API responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CropProfile {
    pub name: String,
    pub planting_density_per_ha: f64,
    pub spacing: String,
    pub yield_per_plant_kg: f64,
    pub cycle_days: u32,
    pub ideal_temperature_c: Vec<f64>,
    pub ideal_humidity_pct: Vec<f64>,
    pub ideal_ph: Vec<f64>,
    pub baseline_npk_kg_ha: Vec<f64>,
    pub pests: Vec<String>,
    pub diseases: Vec<String>,
}

impl From<&AgronomicProfile> for CropProfile {
    fn from(p: &AgronomicProfile) -> Self {
        Self {
            name: p.name.to_string(),
            planting_density_per_ha: p.planting_density,
            spacing: p.spacing.to_string(),
            yield_per_plant_kg: p.yield_per_plant_kg,
            cycle_days: p.cycle_days,
            ideal_temperature_c: vec![p.ideal_temperature.min, p.ideal_temperature.max],
            ideal_humidity_pct: vec![p.ideal_humidity.min, p.ideal_humidity.max],
            ideal_ph: vec![p.ideal_ph.min, p.ideal_ph.max],
            baseline_npk_kg_ha: vec![
                p.baseline.nitrogen,
                p.baseline.phosphorus,
                p.baseline.potassium,
            ],
            pests: p.pests.iter().map(|s| s.to_string()).collect(),
            diseases: p.diseases.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExpectedYield {
    pub crop: String,
    pub area_m2: f64,
    pub plants: u64,
    pub yield_kg: f64,
    pub boxes: f64,
    pub cycle_days: u32,
}

pub fn expected_yield(crop: &str, area_m2: f64) -> Option<ExpectedYield> {
    let p = profile(crop)?;
    let plants = plants_for(p, area_m2);
    let yield_kg = plants * p.yield_per_plant_kg;

    Some(ExpectedYield {
        crop: p.name.to_string(),
        area_m2,
        plants: plants.max(0.0).floor() as u64,
        yield_kg: round_to(yield_kg, 2),
        boxes: round_to(yield_kg / BOX_WEIGHT_KG, 1),
        cycle_days: p.cycle_days,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    LowTemperature,
    HighTemperature,
    LowHumidity,
    HighHumidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

/// Compare readings against the crop's ideal bands; at most one temperature
/// and one humidity advisory
pub fn climate_advisories(crop: &str, temperature: f64, humidity: f64) -> Vec<Advisory> {
    let Some(p) = profile(crop) else {
        return Vec::new();
    };
    let mut advisories = Vec::new();

    if temperature < p.ideal_temperature.min {
        advisories.push(Advisory {
            kind: AdvisoryKind::LowTemperature,
            message: format!("Low temperature ({temperature}°C) - consider heating or row covers"),
        });
    } else if temperature > p.ideal_temperature.max {
        advisories.push(Advisory {
            kind: AdvisoryKind::HighTemperature,
            message: format!("High temperature ({temperature}°C) - increase ventilation or shading"),
        });
    }

    if humidity < p.ideal_humidity.min {
        advisories.push(Advisory {
            kind: AdvisoryKind::LowHumidity,
            message: format!("Low humidity ({humidity}%) - increase irrigation"),
        });
    } else if humidity > p.ideal_humidity.max {
        advisories.push(Advisory {
            kind: AdvisoryKind::HighHumidity,
            message: format!("High humidity ({humidity}%) - disease risk, improve ventilation"),
        });
    }

    advisories
}

/// The four growth phases that scale fertilization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPhase {
    Vegetative,
    Flowering,
    Fruiting,
    Ripening,
}

impl GrowthPhase {
    /// Recognizes the default stage names and their English equivalents
    pub fn from_stage_name(stage: &str) -> Option<Self> {
        match stage {
            "Vegetative" | "Germinação/Vegetativo" => Some(GrowthPhase::Vegetative),
            "Flowering" | "Floração" => Some(GrowthPhase::Flowering),
            "Fruiting" | "Frutificação" => Some(GrowthPhase::Fruiting),
            "Ripening" | "Maturação" => Some(GrowthPhase::Ripening),
            _ => None,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            GrowthPhase::Vegetative => 0.6,
            GrowthPhase::Flowering => 1.0,
            GrowthPhase::Fruiting => 0.8,
            GrowthPhase::Ripening => 0.4,
        }
    }
}

pub fn stage_factor(stage: &str) -> f64 {
    GrowthPhase::from_stage_name(stage).map_or(1.0, GrowthPhase::factor)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FertilizationDose {
    pub crop: String,
    pub area_m2: f64,
    pub stage: String,
    pub stage_factor: f64,
    pub nitrogen_kg: f64,
    pub phosphorus_kg: f64,
    pub potassium_kg: f64,
}

pub fn fertilization_dose(crop: &str, area_m2: f64, stage: &str) -> Option<FertilizationDose> {
    let p = profile(crop)?;
    let area_ha = area_m2 / SQ_METERS_PER_HECTARE;
    let factor = stage_factor(stage);
    let dose = |baseline: f64| round_to(baseline * area_ha * factor, 2);

    Some(FertilizationDose {
        crop: p.name.to_string(),
        area_m2,
        stage: stage.to_string(),
        stage_factor: factor,
        nitrogen_kg: dose(p.baseline.nitrogen),
        phosphorus_kg: dose(p.baseline.phosphorus),
        potassium_kg: dose(p.baseline.potassium),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SanitaryRisk {
    FungalDisease,
    Pest,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SanitaryAlert {
    pub risk: SanitaryRisk,
    pub message: String,
    pub threats: Vec<String>,
}

pub fn sanitary_alerts(crop: &str, temperature: f64, humidity: f64) -> Vec<SanitaryAlert> {
    let Some(p) = profile(crop) else {
        return Vec::new();
    };
    let mut alerts = Vec::new();

    if humidity > 80.0 {
        let threats: Vec<String> = p.diseases.iter().take(2).map(|s| s.to_string()).collect();
        alerts.push(SanitaryAlert {
            risk: SanitaryRisk::FungalDisease,
            message: format!(
                "Conditions favour fungal diseases in {}. Common diseases: {}",
                p.name,
                threats.join(", ")
            ),
            threats,
        });
    }

    if temperature > 28.0 && humidity > 70.0 {
        let threats: Vec<String> = p.pests.iter().take(2).map(|s| s.to_string()).collect();
        alerts.push(SanitaryAlert {
            risk: SanitaryRisk::Pest,
            message: format!(
                "Conditions favour pests in {}. Common pests: {}",
                p.name,
                threats.join(", ")
            ),
            threats,
        });
    }

    alerts
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SpaceOptimization {
    pub crop: String,
    pub area_m2: f64,
    pub plants: u64,
    pub estimated_yield_kg: f64,
    pub yield_per_m2: f64,
    pub spacing: String,
}

pub fn space_optimization(crop: &str, area_m2: f64) -> Option<SpaceOptimization> {
    let p = profile(crop)?;
    let plants = plants_for(p, area_m2);
    let yield_kg = plants * p.yield_per_plant_kg;
    let yield_per_m2 = if area_m2 > 0.0 {
        round_to(yield_kg / area_m2, 3)
    } else {
        0.0
    };

    Some(SpaceOptimization {
        crop: p.name.to_string(),
        area_m2,
        plants: plants.max(0.0).floor() as u64,
        estimated_yield_kg: round_to(yield_kg, 2),
        yield_per_m2,
        spacing: p.spacing.to_string(),
    })
}
