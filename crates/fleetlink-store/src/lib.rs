//! Persistent store for fleet drivers, vehicles, associations and ledgers
//!
//! All tables live in a single `fleet.json` under the store directory. The
//! store is shared between threads; every mutation is applied to a draft copy
//! under the lock and only committed once the file write succeeds, so a failed
//! write leaves the in-memory state untouched.

mod tables;

pub use tables::FleetData;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use fleetlink_types::{
    Association, Driver, DriverFields, DriverId, Payment, Repair, Result, StoreError, Vehicle,
    VehicleFields, VehicleId,
};
use tracing::{debug, warn};

const STORE_FILE: &str = "fleet.json";

/// Thread-safe fleet store
pub struct FleetStore {
    store_path: Option<PathBuf>,
    data: Mutex<FleetData>,
}

impl FleetStore {
    /// Create or load a store under `store_dir`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join(STORE_FILE);

        let data = if store_path.exists() {
            let file = File::open(&store_path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)?
        } else {
            FleetData::default()
        };

        debug!(path = %store_path.display(), "opened fleet store");
        Ok(Self {
            store_path: Some(store_path),
            data: Mutex::new(data),
        })
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            store_path: None,
            data: Mutex::new(FleetData::default()),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, FleetData>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn persist(&self, data: &FleetData) -> std::result::Result<(), StoreError> {
        let Some(path) = &self.store_path else {
            return Ok(());
        };
        // Write a sibling file and rename it over the store so a crash never
        // leaves a truncated fleet.json
        let write = || -> std::io::Result<()> {
            let tmp_path = path.with_extension("json.tmp");
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, data)?;
            writer.flush()?;
            fs::rename(&tmp_path, path)
        };
        write().map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to persist fleet store");
            StoreError::Unavailable(e.to_string())
        })
    }

    fn read<T>(&self, f: impl FnOnce(&FleetData) -> T) -> std::result::Result<T, StoreError> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Apply `f` to a draft and commit it only if the write reaches disk
    fn write<T>(
        &self,
        f: impl FnOnce(&mut FleetData) -> std::result::Result<T, StoreError>,
    ) -> std::result::Result<T, StoreError> {
        let mut guard = self.lock()?;
        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        self.persist(&draft)?;
        *guard = draft;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Drivers
    // ------------------------------------------------------------------

    /// Insert a new driver; the license number must be unused
    pub fn insert_driver(&self, fields: DriverFields) -> std::result::Result<Driver, StoreError> {
        self.write(|data| {
            if data.driver_by_license(&fields.license_number).is_some() {
                return Err(StoreError::Duplicate(format!(
                    "license number {}",
                    fields.license_number
                )));
            }
            let driver = fields.into_driver(DriverId::generate());
            data.drivers.insert(driver.id.clone(), driver.clone());
            Ok(driver)
        })
    }

    pub fn driver(&self, id: &DriverId) -> std::result::Result<Option<Driver>, StoreError> {
        self.read(|data| data.drivers.get(id).cloned())
    }

    pub fn driver_by_license(
        &self,
        license_number: &str,
    ) -> std::result::Result<Option<Driver>, StoreError> {
        self.read(|data| data.driver_by_license(license_number).cloned())
    }

    /// Replace a driver's profile fields
    pub fn update_driver(
        &self,
        id: &DriverId,
        fields: DriverFields,
    ) -> std::result::Result<Driver, StoreError> {
        self.write(|data| {
            if let Some(other) = data.driver_by_license(&fields.license_number) {
                if &other.id != id {
                    return Err(StoreError::Duplicate(format!(
                        "license number {}",
                        fields.license_number
                    )));
                }
            }
            let driver = data
                .drivers
                .get_mut(id)
                .ok_or_else(|| StoreError::MissingDriver(id.clone()))?;
            driver.name = fields.name;
            driver.contact = fields.contact;
            driver.license_number = fields.license_number;
            Ok(driver.clone())
        })
    }

    /// Remove a driver together with its associations and payments
    pub fn remove_driver(&self, id: &DriverId) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            if data.drivers.remove(id).is_none() {
                return Ok(false);
            }
            data.associations.retain(|a| &a.driver_id != id);
            data.payments.retain(|p| &p.driver_id != id);
            Ok(true)
        })
    }

    /// All drivers sorted by name
    pub fn drivers(&self) -> std::result::Result<Vec<Driver>, StoreError> {
        self.read(|data| {
            let mut drivers: Vec<_> = data.drivers.values().cloned().collect();
            drivers.sort_by(|a, b| a.name.cmp(&b.name));
            drivers
        })
    }

    // ------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------

    /// Insert a new vehicle; the vehicle number must be unused
    pub fn insert_vehicle(&self, fields: VehicleFields) -> std::result::Result<Vehicle, StoreError> {
        self.write(|data| {
            if data.vehicle_by_number(&fields.vehicle_number).is_some() {
                return Err(StoreError::Duplicate(format!(
                    "vehicle number {}",
                    fields.vehicle_number
                )));
            }
            let vehicle = fields.into_vehicle(VehicleId::generate());
            data.vehicles.insert(vehicle.id.clone(), vehicle.clone());
            Ok(vehicle)
        })
    }

    /// Update metadata of an existing vehicle or insert a new one.
    /// Returns the stored vehicle and whether it was newly created.
    pub fn upsert_vehicle(
        &self,
        fields: VehicleFields,
    ) -> std::result::Result<(Vehicle, bool), StoreError> {
        self.write(|data| {
            let existing = data
                .vehicle_by_number(&fields.vehicle_number)
                .map(|v| v.id.clone());
            match existing.and_then(|id| data.vehicles.get_mut(&id)) {
                Some(vehicle) => {
                    vehicle.vehicle_type = fields.vehicle_type;
                    vehicle.brand = fields.brand;
                    vehicle.status = fields.status;
                    if fields.purchase_date.is_some() {
                        vehicle.purchase_date = fields.purchase_date;
                    }
                    Ok((vehicle.clone(), false))
                }
                None => {
                    let vehicle = fields.into_vehicle(VehicleId::generate());
                    data.vehicles.insert(vehicle.id.clone(), vehicle.clone());
                    Ok((vehicle, true))
                }
            }
        })
    }

    pub fn vehicle(&self, id: &VehicleId) -> std::result::Result<Option<Vehicle>, StoreError> {
        self.read(|data| data.vehicles.get(id).cloned())
    }

    pub fn vehicle_by_number(
        &self,
        vehicle_number: &str,
    ) -> std::result::Result<Option<Vehicle>, StoreError> {
        self.read(|data| data.vehicle_by_number(vehicle_number).cloned())
    }

    /// Remove a vehicle together with its associations and repair records
    pub fn remove_vehicle(&self, id: &VehicleId) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            if data.vehicles.remove(id).is_none() {
                return Ok(false);
            }
            data.associations.retain(|a| &a.vehicle_id != id);
            data.repairs.retain(|r| &r.vehicle_id != id);
            Ok(true)
        })
    }

    /// All vehicles sorted by vehicle number
    pub fn vehicles(&self) -> std::result::Result<Vec<Vehicle>, StoreError> {
        self.read(|data| {
            let mut vehicles: Vec<_> = data.vehicles.values().cloned().collect();
            vehicles.sort_by(|a, b| a.vehicle_number.cmp(&b.vehicle_number));
            vehicles
        })
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    pub fn association_exists(
        &self,
        driver_id: &DriverId,
        vehicle_id: &VehicleId,
    ) -> std::result::Result<bool, StoreError> {
        self.read(|data| {
            data.associations
                .contains(&Association::new(driver_id.clone(), vehicle_id.clone()))
        })
    }

    /// Insert one association row.
    ///
    /// Fails with `ConstraintViolation` if the pair is already linked and with
    /// `MissingDriver` / `MissingVehicle` if either side does not exist.
    pub fn insert_association(
        &self,
        driver_id: &DriverId,
        vehicle_id: &VehicleId,
    ) -> std::result::Result<(), StoreError> {
        self.write(|data| data.link(driver_id, vehicle_id))
    }

    /// Insert one row per vehicle, committing every row that succeeds
    pub fn bulk_insert_associations(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> std::result::Result<Vec<std::result::Result<(), StoreError>>, StoreError> {
        self.write(|data| {
            Ok(vehicle_ids
                .iter()
                .map(|vehicle_id| data.link(driver_id, vehicle_id))
                .collect())
        })
    }

    /// Drop every association of a driver and insert the given set, committed
    /// as one write. Returns the number of rows removed and per-row results.
    pub fn replace_associations_for_driver(
        &self,
        driver_id: &DriverId,
        vehicle_ids: &[VehicleId],
    ) -> std::result::Result<(usize, Vec<std::result::Result<(), StoreError>>), StoreError> {
        self.write(|data| {
            let before = data.associations.len();
            data.associations.retain(|a| &a.driver_id != driver_id);
            let removed = before - data.associations.len();
            let inserted = vehicle_ids
                .iter()
                .map(|vehicle_id| data.link(driver_id, vehicle_id))
                .collect();
            Ok((removed, inserted))
        })
    }

    pub fn remove_association(
        &self,
        driver_id: &DriverId,
        vehicle_id: &VehicleId,
    ) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            Ok(data
                .associations
                .remove(&Association::new(driver_id.clone(), vehicle_id.clone())))
        })
    }

    /// Remove every association of a driver, returning how many rows went away
    pub fn remove_associations_for_driver(
        &self,
        driver_id: &DriverId,
    ) -> std::result::Result<usize, StoreError> {
        self.write(|data| {
            let before = data.associations.len();
            data.associations.retain(|a| &a.driver_id != driver_id);
            Ok(before - data.associations.len())
        })
    }

    pub fn vehicles_for_driver(
        &self,
        driver_id: &DriverId,
    ) -> std::result::Result<Vec<Vehicle>, StoreError> {
        self.read(|data| {
            let mut vehicles: Vec<_> = data
                .associations
                .iter()
                .filter(|a| &a.driver_id == driver_id)
                .filter_map(|a| data.vehicles.get(&a.vehicle_id).cloned())
                .collect();
            vehicles.sort_by(|a, b| a.vehicle_number.cmp(&b.vehicle_number));
            vehicles
        })
    }

    pub fn drivers_for_vehicle(
        &self,
        vehicle_id: &VehicleId,
    ) -> std::result::Result<Vec<Driver>, StoreError> {
        self.read(|data| {
            data.associations
                .iter()
                .filter(|a| &a.vehicle_id == vehicle_id)
                .filter_map(|a| data.drivers.get(&a.driver_id).cloned())
                .collect()
        })
    }

    pub fn associations(&self) -> std::result::Result<Vec<Association>, StoreError> {
        self.read(|data| data.associations.iter().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Ledgers
    // ------------------------------------------------------------------

    /// Insert or overwrite the payment for (driver, date). Returns true when inserted.
    pub fn upsert_payment(&self, payment: Payment) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            if !data.drivers.contains_key(&payment.driver_id) {
                return Err(StoreError::MissingDriver(payment.driver_id.clone()));
            }
            match data
                .payments
                .iter_mut()
                .find(|p| p.driver_id == payment.driver_id && p.date == payment.date)
            {
                Some(existing) => {
                    existing.purpose = payment.purpose;
                    existing.amount = payment.amount;
                    Ok(false)
                }
                None => {
                    data.payments.push(payment);
                    Ok(true)
                }
            }
        })
    }

    pub fn remove_payment(
        &self,
        driver_id: &DriverId,
        date: NaiveDate,
    ) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            let before = data.payments.len();
            data.payments
                .retain(|p| !(&p.driver_id == driver_id && p.date == date));
            Ok(data.payments.len() != before)
        })
    }

    /// All payments ordered by date
    pub fn payments(&self) -> std::result::Result<Vec<Payment>, StoreError> {
        self.read(|data| {
            let mut payments = data.payments.clone();
            payments.sort_by_key(|p| p.date);
            payments
        })
    }

    /// Insert or overwrite the repair record for (vehicle, date). Returns true when inserted.
    pub fn upsert_repair(&self, repair: Repair) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            if !data.vehicles.contains_key(&repair.vehicle_id) {
                return Err(StoreError::MissingVehicle(repair.vehicle_id.clone()));
            }
            match data
                .repairs
                .iter_mut()
                .find(|r| r.vehicle_id == repair.vehicle_id && r.date == repair.date)
            {
                Some(existing) => {
                    existing.description = repair.description;
                    existing.amount = repair.amount;
                    Ok(false)
                }
                None => {
                    data.repairs.push(repair);
                    Ok(true)
                }
            }
        })
    }

    pub fn remove_repair(
        &self,
        vehicle_id: &VehicleId,
        date: NaiveDate,
    ) -> std::result::Result<bool, StoreError> {
        self.write(|data| {
            let before = data.repairs.len();
            data.repairs
                .retain(|r| !(&r.vehicle_id == vehicle_id && r.date == date));
            Ok(data.repairs.len() != before)
        })
    }

    /// All repair records ordered by date
    pub fn repairs(&self) -> std::result::Result<Vec<Repair>, StoreError> {
        self.read(|data| {
            let mut repairs = data.repairs.clone();
            repairs.sort_by_key(|r| r.date);
            repairs
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_pair() -> (FleetStore, Driver, Vehicle) {
        let store = FleetStore::in_memory();
        let driver = store
            .insert_driver(DriverFields::new("L1", "Asha"))
            .unwrap();
        let vehicle = store
            .insert_vehicle(VehicleFields::new("KA-01-AB-1234"))
            .unwrap();
        (store, driver, vehicle)
    }

    #[test]
    fn test_duplicate_license_rejected() {
        let store = FleetStore::in_memory();
        store.insert_driver(DriverFields::new("L1", "Asha")).unwrap();
        let err = store
            .insert_driver(DriverFields::new("L1", "Other"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn test_association_uniqueness() {
        let (store, driver, vehicle) = store_with_pair();
        store.insert_association(&driver.id, &vehicle.id).unwrap();
        let err = store
            .insert_association(&driver.id, &vehicle.id)
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
        assert_eq!(store.associations().unwrap().len(), 1);
    }

    #[test]
    fn test_association_requires_both_sides() {
        let (store, driver, _) = store_with_pair();
        let ghost = VehicleId::from("ghost");
        let err = store.insert_association(&driver.id, &ghost).unwrap_err();
        assert_eq!(err, StoreError::MissingVehicle(ghost));
        assert!(store.associations().unwrap().is_empty());
    }

    #[test]
    fn test_bulk_insert_keeps_successful_rows() {
        let (store, driver, vehicle) = store_with_pair();
        let ids = vec![vehicle.id.clone(), vehicle.id.clone(), VehicleId::from("ghost")];
        let results = store.bulk_insert_associations(&driver.id, &ids).unwrap();

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(StoreError::ConstraintViolation { .. })));
        assert!(matches!(results[2], Err(StoreError::MissingVehicle(_))));
        assert_eq!(store.associations().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_associations_swaps_set() {
        let (store, driver, a) = store_with_pair();
        let b = store.insert_vehicle(VehicleFields::new("B")).unwrap();
        store.insert_association(&driver.id, &a.id).unwrap();

        let (removed, inserted) = store
            .replace_associations_for_driver(&driver.id, &[b.id.clone()])
            .unwrap();

        assert_eq!(removed, 1);
        assert!(inserted[0].is_ok());
        let vehicles = store.vehicles_for_driver(&driver.id).unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].id, b.id);
    }

    #[test]
    fn test_remove_driver_cascades() {
        let (store, driver, vehicle) = store_with_pair();
        store.insert_association(&driver.id, &vehicle.id).unwrap();
        store
            .upsert_payment(Payment {
                driver_id: driver.id.clone(),
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                purpose: "salary".to_string(),
                amount: 1200.0,
            })
            .unwrap();

        assert!(store.remove_driver(&driver.id).unwrap());
        assert!(store.associations().unwrap().is_empty());
        assert!(store.payments().unwrap().is_empty());
        assert!(store.vehicle(&vehicle.id).unwrap().is_some());
    }

    #[test]
    fn test_remove_vehicle_cascades() {
        let (store, driver, vehicle) = store_with_pair();
        store.insert_association(&driver.id, &vehicle.id).unwrap();
        store
            .upsert_repair(Repair {
                vehicle_id: vehicle.id.clone(),
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                description: "brakes".to_string(),
                amount: 300.0,
            })
            .unwrap();

        assert!(store.remove_vehicle(&vehicle.id).unwrap());
        assert!(store.associations().unwrap().is_empty());
        assert!(store.repairs().unwrap().is_empty());
        assert!(store.driver(&driver.id).unwrap().is_some());
    }

    #[test]
    fn test_upsert_payment_overwrites_same_day() {
        let (store, driver, _) = store_with_pair();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let payment = |amount: f64| Payment {
            driver_id: driver.id.clone(),
            date,
            purpose: "advance".to_string(),
            amount,
        };

        assert!(store.upsert_payment(payment(100.0)).unwrap());
        assert!(!store.upsert_payment(payment(250.0)).unwrap());
        let payments = store.payments().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 250.0);
    }
}
