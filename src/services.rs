pub mod cost_service;
pub mod error;
pub mod phenology_service;
pub mod production_service;
pub mod report_service;
pub mod settings_service;
pub mod supply_service;

pub use cost_service::CostService;
pub use error::ServiceError;
pub use phenology_service::PhenologyService;
pub use production_service::ProductionService;
pub use report_service::ReportService;
pub use settings_service::SettingsService;
pub use supply_service::SupplyService;
