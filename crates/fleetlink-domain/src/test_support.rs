//! In-memory collaborators for unit tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use fleetlink_types::{Driver, DriverFields, DriverId, StoreError, VehicleId};

use crate::repository::{AssociationStore, DriverDirectory, InsertResult, VehicleDirectory};

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fleetlink_domain=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct State {
    drivers: BTreeMap<DriverId, Driver>,
    vehicles: BTreeMap<String, VehicleId>,
    links: BTreeSet<(DriverId, VehicleId)>,
}

#[derive(Default)]
pub struct MemoryFleet {
    state: Mutex<State>,
    unavailable: AtomicBool,
    fail_creates: AtomicBool,
    insert_delay: Option<Duration>,
    resolve_delay: Option<Duration>,
}

impl MemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = Some(delay);
        self
    }

    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_creates(&self, value: bool) {
        self.fail_creates.store(value, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    pub fn add_driver(&self, license: &str) -> DriverId {
        let driver = DriverFields::new(license, license).into_driver(DriverId::generate());
        let id = driver.id.clone();
        self.state.lock().unwrap().drivers.insert(id.clone(), driver);
        id
    }

    pub fn add_vehicle(&self, number: &str) -> VehicleId {
        let id = VehicleId::generate();
        self.state
            .lock()
            .unwrap()
            .vehicles
            .insert(number.to_string(), id.clone());
        id
    }

    pub fn link(&self, driver: &DriverId, vehicle: &VehicleId) {
        self.state
            .lock()
            .unwrap()
            .links
            .insert((driver.clone(), vehicle.clone()));
    }

    pub fn links_of(&self, driver: &DriverId) -> Vec<VehicleId> {
        self.state
            .lock()
            .unwrap()
            .links
            .iter()
            .filter(|(d, _)| d == driver)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.state.lock().unwrap().links.len()
    }

    pub fn driver_count(&self) -> usize {
        self.state.lock().unwrap().drivers.len()
    }

    fn insert_locked(state: &mut State, driver: &DriverId, vehicle: &VehicleId) -> InsertResult {
        if !state.drivers.contains_key(driver) {
            return Err(StoreError::MissingDriver(driver.clone()));
        }
        if !state.vehicles.values().any(|v| v == vehicle) {
            return Err(StoreError::MissingVehicle(vehicle.clone()));
        }
        if !state.links.insert((driver.clone(), vehicle.clone())) {
            return Err(StoreError::ConstraintViolation {
                driver_id: driver.clone(),
                vehicle_id: vehicle.clone(),
            });
        }
        Ok(())
    }
}

impl DriverDirectory for MemoryFleet {
    fn resolve(&self, id: &DriverId) -> Result<Option<Driver>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().drivers.get(id).cloned())
    }

    fn resolve_license(&self, license_number: &str) -> Result<Option<Driver>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .drivers
            .values()
            .find(|d| d.license_number == license_number)
            .cloned())
    }

    fn create(&self, fields: DriverFields) -> Result<Driver, StoreError> {
        self.check()?;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated create failure".to_string()));
        }
        let driver = fields.into_driver(DriverId::generate());
        self.state
            .lock()
            .unwrap()
            .drivers
            .insert(driver.id.clone(), driver.clone());
        Ok(driver)
    }
}

impl VehicleDirectory for MemoryFleet {
    fn resolve(&self, vehicle_number: &str) -> Result<Option<VehicleId>, StoreError> {
        self.check()?;
        if let Some(delay) = self.resolve_delay {
            thread::sleep(delay);
        }
        Ok(self.state.lock().unwrap().vehicles.get(vehicle_number).cloned())
    }
}

impl AssociationStore for MemoryFleet {
    fn exists(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .links
            .contains(&(driver_id.clone(), vehicle_id.clone())))
    }

    fn insert(&self, driver_id: &DriverId, vehicle_id: &VehicleId) -> Result<(), StoreError> {
        self.check()?;
        if let Some(delay) = self.insert_delay {
            thread::sleep(delay);
        }
        let mut state = self.state.lock().unwrap();
        Self::insert_locked(&mut state, driver_id, vehicle_id)
    }

    fn delete_all_for_driver(&self, driver_id: &DriverId) -> Result<usize, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.links.len();
        state.links.retain(|(d, _)| d != driver_id);
        Ok(before - state.links.len())
    }

    fn bulk_insert(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<InsertResult>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(vehicle_ids
            .iter()
            .map(|vehicle_id| Self::insert_locked(&mut state, driver_id, vehicle_id))
            .collect())
    }
}
