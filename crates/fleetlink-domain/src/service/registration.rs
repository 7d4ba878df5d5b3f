//! Register a driver together with an initial set of vehicles

use fleetlink_types::{
    DriverFields, DriverId, ReconcileError, ReconciliationReport, ReconciliationRequest,
    StoreError,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::service::reconciler::Reconciler;

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub driver_id: DriverId,
    /// False when the license number was already registered
    pub created: bool,
    pub report: ReconciliationReport,
}

/// Creates the driver if the license is unknown, then merges the vehicles
#[derive(Debug, Clone)]
pub struct DriverRegistrar {
    reconciler: Reconciler,
}

impl DriverRegistrar {
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    /// A second submission for the same license attaches further vehicles
    /// instead of failing. Driver creation failures abort before any vehicle
    /// is touched.
    pub fn register(
        &self,
        fields: DriverFields,
        vehicle_numbers: Vec<String>,
    ) -> Result<RegistrationOutcome, ReconcileError> {
        let (driver_id, created) = self.find_or_create(fields)?;
        let report = self
            .reconciler
            .reconcile(&ReconciliationRequest::merge(driver_id.clone(), vehicle_numbers))?;

        Ok(RegistrationOutcome {
            driver_id,
            created,
            report,
        })
    }

    fn find_or_create(&self, fields: DriverFields) -> Result<(DriverId, bool), ReconcileError> {
        let drivers = self.reconciler.drivers();
        if let Some(existing) = drivers
            .resolve_license(&fields.license_number)
            .map_err(|e| ReconcileError::StoreUnavailable(e.to_string()))?
        {
            return Ok((existing.id, false));
        }

        let license_number = fields.license_number.clone();
        match drivers.create(fields) {
            Ok(driver) => {
                info!(driver = %driver.id, license = %license_number, "driver created");
                Ok((driver.id, true))
            }
            // Another registration for the same license won the race
            Err(StoreError::Duplicate(_)) => drivers
                .resolve_license(&license_number)
                .map_err(|e| ReconcileError::StoreUnavailable(e.to_string()))?
                .map(|driver| (driver.id, false))
                .ok_or_else(|| ReconcileError::DriverCreation(license_number)),
            Err(err) => {
                warn!(license = %license_number, error = %err, "driver creation failed");
                Err(ReconcileError::DriverCreation(err.to_string()))
            }
        }
    }
}
