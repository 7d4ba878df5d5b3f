//! Driver/vehicle directories and association store over [`FleetStore`]

use std::sync::Arc;

use fleetlink_domain::repository::{
    AssociationStore, DriverDirectory, InsertResult, VehicleDirectory,
};
use fleetlink_store::FleetStore;
use fleetlink_types::{Driver, DriverFields, DriverId, StoreError, VehicleId};

/// Exposes one [`FleetStore`] through all three collaborator traits
#[derive(Clone)]
pub struct FleetDirectory {
    store: Arc<FleetStore>,
}

impl FleetDirectory {
    pub fn new(store: Arc<FleetStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<FleetStore> {
        &self.store
    }
}

impl DriverDirectory for FleetDirectory {
    fn resolve(&self, id: &DriverId) -> Result<Option<Driver>, StoreError> {
        self.store.driver(id)
    }

    fn resolve_license(&self, license_number: &str) -> Result<Option<Driver>, StoreError> {
        self.store.driver_by_license(license_number)
    }

    fn create(&self, fields: DriverFields) -> Result<Driver, StoreError> {
        self.store.insert_driver(fields)
    }
}

impl VehicleDirectory for FleetDirectory {
    fn resolve(&self, vehicle_number: &str) -> Result<Option<VehicleId>, StoreError> {
        Ok(self
            .store
            .vehicle_by_number(vehicle_number)?
            .map(|vehicle| vehicle.id))
    }
}

impl AssociationStore for FleetDirectory {
    fn exists(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<bool, StoreError> {
        self.store.association_exists(driver_id, vehicle_id)
    }

    fn insert(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<(), StoreError> {
        self.store.insert_association(driver_id, vehicle_id)
    }

    fn delete_all_for_driver(&self, driver_id: &DriverId) -> Result<usize, StoreError> {
        self.store.remove_associations_for_driver(driver_id)
    }

    fn bulk_insert(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<InsertResult>, StoreError> {
        self.store.bulk_insert_associations(driver_id, vehicle_ids)
    }

    // One write, so a failure cannot leave the driver with an empty set
    fn replace_for_driver(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> Result<(usize, Vec<InsertResult>), StoreError> {
        self.store
            .replace_associations_for_driver(driver_id, vehicle_ids)
    }
}
