//! Driver–vehicle association reconciler
//!
//! Brings a driver's persisted association set into agreement with a desired
//! list of vehicle numbers:
//!
//! - **Merge**: resolve each number, skip pairs that already exist, insert the
//!   rest. Every item is reported; none aborts the batch.
//! - **Replace**: resolve each number, then swap the driver's whole set for the
//!   resolved vehicles in one store call.
//!
//! No lock is taken here. Two racing merges for the same pair are settled by
//! the store's uniqueness constraint, and the loser reports
//! `AlreadyAssociated`.

use std::sync::Arc;
use std::time::Instant;

use fleetlink_types::{
    DriverId, FailureKind, OutcomeKind, ReconcileError, ReconcileMode, ReconciliationReport,
    ReconciliationRequest, StoreError, VehicleId,
};
use tracing::{debug, info, warn};

use crate::repository::{AssociationStore, DriverDirectory, VehicleDirectory};
use crate::service::aggregator::{ItemResult, Operation, OutcomeAggregator};

#[derive(Clone)]
pub struct Reconciler {
    drivers: Arc<dyn DriverDirectory>,
    vehicles: Arc<dyn VehicleDirectory>,
    associations: Arc<dyn AssociationStore>,
    aggregator: OutcomeAggregator,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

/// Map a store error raised for one item to its report entry
pub fn failure_kind(err: &StoreError) -> FailureKind {
    match err {
        StoreError::ConstraintViolation { .. } => FailureKind::AlreadyAssociated,
        StoreError::MissingVehicle(_) => FailureKind::VehicleNotFound,
        StoreError::MissingDriver(_) => FailureKind::DriverNotFound,
        _ => FailureKind::StoreUnavailable,
    }
}

impl Reconciler {
    pub fn new(
        drivers: Arc<dyn DriverDirectory>,
        vehicles: Arc<dyn VehicleDirectory>,
        associations: Arc<dyn AssociationStore>,
    ) -> Self {
        Self {
            drivers,
            vehicles,
            associations,
            aggregator: OutcomeAggregator::default(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: OutcomeAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn drivers(&self) -> &Arc<dyn DriverDirectory> {
        &self.drivers
    }

    pub fn aggregator(&self) -> &OutcomeAggregator {
        &self.aggregator
    }

    /// Reconcile one driver's associations against the requested vehicle list
    pub fn reconcile(
        &self,
        request: &ReconciliationRequest,
    ) -> Result<ReconciliationReport, ReconcileError> {
        self.ensure_driver(&request.driver_id)?;

        let report = match request.mode {
            ReconcileMode::Merge => self.merge(&request.driver_id, &request.vehicle_numbers),
            ReconcileMode::Replace => {
                self.replace(&request.driver_id, &request.vehicle_numbers)?
            }
        };

        info!(
            driver = %request.driver_id,
            mode = ?request.mode,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "reconcile finished"
        );
        Ok(report)
    }

    fn ensure_driver(&self, driver_id: &DriverId) -> Result<(), ReconcileError> {
        match self.drivers.resolve(driver_id) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ReconcileError::DriverNotFound(driver_id.to_string())),
            Err(err) => {
                warn!(driver = %driver_id, error = %err, "driver lookup failed");
                Err(ReconcileError::StoreUnavailable(err.to_string()))
            }
        }
    }

    fn merge(&self, driver_id: &DriverId, vehicle_numbers: &[String]) -> ReconciliationReport {
        let operations: Vec<(String, Operation<OutcomeKind>)> = vehicle_numbers
            .iter()
            .map(|number| {
                let vehicles = Arc::clone(&self.vehicles);
                let associations = Arc::clone(&self.associations);
                let driver_id = driver_id.clone();
                let vehicle_number = number.clone();
                let op: Operation<OutcomeKind> = Box::new(move || {
                    let vehicle_id = resolve_vehicle(vehicles.as_ref(), &vehicle_number)?;
                    link(associations.as_ref(), &driver_id, &vehicle_id)
                });
                (number.clone(), op)
            })
            .collect();

        self.aggregator.aggregate(operations)
    }

    fn replace(
        &self,
        driver_id: &DriverId,
        vehicle_numbers: &[String],
    ) -> Result<ReconciliationReport, ReconcileError> {
        let deadline = self.aggregator.deadline_from_now();
        let operations: Vec<(String, Operation<VehicleId>)> = vehicle_numbers
            .iter()
            .map(|number| {
                let vehicles = Arc::clone(&self.vehicles);
                let vehicle_number = number.clone();
                let op: Operation<VehicleId> =
                    Box::new(move || resolve_vehicle(vehicles.as_ref(), &vehicle_number));
                (number.clone(), op)
            })
            .collect();

        let mut report = ReconciliationReport::default();
        let mut resolved: Vec<(String, VehicleId)> = Vec::new();
        for (number, result) in self.aggregator.join_until(operations, deadline) {
            match result {
                Ok(vehicle_id) => resolved.push((number, vehicle_id)),
                Err(kind) => report.record_failure(number, kind),
            }
        }

        // Past the deadline nothing is touched, so the prior set stays intact
        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(driver = %driver_id, "deadline passed before replace could be applied");
            for (number, _) in resolved {
                report.record_failure(number, FailureKind::Timeout);
            }
            return Ok(report);
        }

        let vehicle_ids: Vec<VehicleId> = resolved.iter().map(|(_, id)| id.clone()).collect();
        let (removed, inserted) = self
            .associations
            .replace_for_driver(driver_id, &vehicle_ids)
            .map_err(|err| {
                warn!(driver = %driver_id, error = %err, "replace failed");
                ReconcileError::from(err)
            })?;
        debug!(driver = %driver_id, removed, "cleared prior associations");

        for ((number, _), result) in resolved.into_iter().zip(inserted) {
            match result {
                Ok(()) => report.record_success(number, OutcomeKind::Replaced),
                Err(err) => report.record_failure(number, failure_kind(&err)),
            }
        }
        Ok(report)
    }
}

fn resolve_vehicle(vehicles: &dyn VehicleDirectory, vehicle_number: &str) -> ItemResult<VehicleId> {
    match vehicles.resolve(vehicle_number) {
        Ok(Some(id)) => Ok(id),
        Ok(None) => {
            debug!(vehicle = vehicle_number, "vehicle not found");
            Err(FailureKind::VehicleNotFound)
        }
        Err(err) => Err(failure_kind(&err)),
    }
}

fn link(
    associations: &dyn AssociationStore,
    driver_id: &DriverId,
    vehicle_id: &VehicleId,
) -> ItemResult<OutcomeKind> {
    if associations.exists(driver_id, vehicle_id).map_err(|e| failure_kind(&e))? {
        return Err(FailureKind::AlreadyAssociated);
    }
    match associations.insert(driver_id, vehicle_id) {
        Ok(()) => Ok(OutcomeKind::Linked),
        // Lost a race with a concurrent insert of the same pair
        Err(err) => Err(failure_kind(&err)),
    }
}
