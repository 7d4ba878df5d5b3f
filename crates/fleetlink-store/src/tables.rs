//! In-memory table layout persisted as one JSON document

use std::collections::{BTreeMap, BTreeSet};

use fleetlink_types::{
    Association, Driver, DriverId, Payment, Repair, StoreError, Vehicle, VehicleId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetData {
    #[serde(default)]
    pub drivers: BTreeMap<DriverId, Driver>,
    #[serde(default)]
    pub vehicles: BTreeMap<VehicleId, Vehicle>,
    /// Set semantics give the (driver, vehicle) uniqueness constraint
    #[serde(default)]
    pub associations: BTreeSet<Association>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub repairs: Vec<Repair>,
}

impl FleetData {
    pub fn driver_by_license(&self, license_number: &str) -> Option<&Driver> {
        self.drivers
            .values()
            .find(|d| d.license_number == license_number)
    }

    pub fn vehicle_by_number(&self, vehicle_number: &str) -> Option<&Vehicle> {
        self.vehicles
            .values()
            .find(|v| v.vehicle_number == vehicle_number)
    }

    /// Add one association row, enforcing referential integrity and uniqueness
    pub(crate) fn link(
        &mut self,
        driver_id: &DriverId,
        vehicle_id: &VehicleId,
    ) -> Result<(), StoreError> {
        if !self.drivers.contains_key(driver_id) {
            return Err(StoreError::MissingDriver(driver_id.clone()));
        }
        if !self.vehicles.contains_key(vehicle_id) {
            return Err(StoreError::MissingVehicle(vehicle_id.clone()));
        }
        if !self
            .associations
            .insert(Association::new(driver_id.clone(), vehicle_id.clone()))
        {
            return Err(StoreError::ConstraintViolation {
                driver_id: driver_id.clone(),
                vehicle_id: vehicle_id.clone(),
            });
        }
        Ok(())
    }
}
