//! Error types for the VitalLog application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitalLogError {
    #[error("Invalid date: {0:?} (expected DD.MM.YYYY)")]
    InvalidDate(String),

    #[error("No values entered for any time slot")]
    EmptyInput,

    #[error("Invalid backup file: {0}")]
    ImportFormat(String),

    #[error("No entries to export")]
    NothingToExport,

    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),

    #[error("Unknown glucose unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("{0}")]
    Usage(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
