pub mod agronomy;
pub mod analytics;
pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod fetch_error;
pub mod importers;
pub mod phenology;
pub mod services;
pub mod settings;
pub mod weather;
