pub mod cost_repository;
pub mod error;
pub mod models;
pub mod phenology_repository;
pub mod pool;
pub mod production_repository;
pub mod supply_repository;

pub use cost_repository::CostRepository;
pub use error::DbError;
pub use models::*;
pub use phenology_repository::PhenologyRepository;
pub use pool::DbPool;
pub use production_repository::ProductionRepository;
pub use supply_repository::SupplyRepository;
