//! Collaborator traits consumed by the reconciler
//!
//! All implementations must be shareable across worker threads; the
//! reconciler dispatches per-vehicle operations concurrently.

use fleetlink_types::{Driver, DriverFields, DriverId, StoreError, VehicleId};

/// Resolves and creates drivers
pub trait DriverDirectory: Send + Sync {
    /// Look up a driver by internal id
    fn resolve(&self, id: &DriverId) -> Result<Option<Driver>, StoreError>;

    /// Look up a driver by license number
    fn resolve_license(&self, license_number: &str) -> Result<Option<Driver>, StoreError>;

    /// Create a new driver record
    fn create(&self, fields: DriverFields) -> Result<Driver, StoreError>;
}

/// Resolves vehicle numbers to internal ids
pub trait VehicleDirectory: Send + Sync {
    fn resolve(&self, vehicle_number: &str) -> Result<Option<VehicleId>, StoreError>;
}

/// Per-item result of a bulk insert
pub type InsertResult = Result<(), StoreError>;

/// Persisted set of (driver, vehicle) pairs.
///
/// The store owns the uniqueness constraint: inserting an existing pair must
/// fail with [`StoreError::ConstraintViolation`] instead of adding a row.
pub trait AssociationStore: Send + Sync {
    fn exists(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<bool, StoreError>;

    fn insert(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<(), StoreError>;

    /// Remove every row of a driver, returning the number removed
    fn delete_all_for_driver(&self, driver_id: &DriverId) -> Result<usize, StoreError>;

    /// Insert one row per vehicle. Rows that succeed stay inserted even when
    /// others fail; the outer error means nothing was attempted.
    fn bulk_insert(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<InsertResult>, StoreError>;

    /// Delete all rows of a driver and insert the given set.
    ///
    /// The default runs the two steps back to back, so a failure between them
    /// leaves the driver with no rows. Stores that can commit both steps in one
    /// write should override this.
    fn replace_for_driver(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> Result<(usize, Vec<InsertResult>), StoreError> {
        let removed = self.delete_all_for_driver(driver_id)?;
        let inserted = self.bulk_insert(driver_id, vehicle_ids)?;
        Ok((removed, inserted))
    }
}
