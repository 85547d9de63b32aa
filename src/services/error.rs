use crate::db::DbError;
use crate::importers::{ExportError, SheetImportError};
use crate::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Import(#[from] SheetImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
