//! Error types for fleetlink

use thiserror::Error;

use crate::{DriverId, VehicleId};

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Errors raised by the persistent store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transient failure: IO, poisoned lock, unreadable backing file
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The (driver, vehicle) pair already has an association row
    #[error("Association already exists: driver {driver_id} / vehicle {vehicle_id}")]
    ConstraintViolation {
        driver_id: DriverId,
        vehicle_id: VehicleId,
    },

    #[error("Driver does not exist: {0}")]
    MissingDriver(DriverId),

    #[error("Vehicle does not exist: {0}")]
    MissingVehicle(VehicleId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),
}

/// Whole-operation failures of a reconcile or registration call
///
/// Per-item problems never show up here; they are collected into the
/// report's failure list instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to create driver: {0}")]
    DriverCreation(String),
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingDriver(id) => ReconcileError::DriverNotFound(id.to_string()),
            other => ReconcileError::StoreUnavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Reconcile failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
