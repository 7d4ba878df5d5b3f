//! Store persistence across reopen

use fleetlink_store::FleetStore;
use fleetlink_types::{DriverFields, StoreError, VehicleFields};
use tempfile::tempdir;

#[test]
fn test_reopen_restores_tables() {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    {
        let store = FleetStore::open(temp_dir.path().to_path_buf()).expect("Failed to open store");
        let driver = store.insert_driver(DriverFields::new("L1", "Asha")).unwrap();
        let vehicle = store
            .insert_vehicle(VehicleFields::new("KA-01-AB-1234").with_brand("Tata"))
            .unwrap();
        store.insert_association(&driver.id, &vehicle.id).unwrap();
    }

    let store = FleetStore::open(temp_dir.path().to_path_buf()).expect("Failed to reopen store");
    let driver = store.driver_by_license("L1").unwrap().expect("driver persisted");
    let vehicles = store.vehicles_for_driver(&driver.id).unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].vehicle_number, "KA-01-AB-1234");
    assert_eq!(vehicles[0].brand.as_deref(), Some("Tata"));
}

#[test]
fn test_failed_insert_is_not_persisted() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = FleetStore::open(temp_dir.path().to_path_buf()).unwrap();
    store.insert_vehicle(VehicleFields::new("V1")).unwrap();
    assert!(store.insert_vehicle(VehicleFields::new("V1")).is_err());

    let reopened = FleetStore::open(temp_dir.path().to_path_buf()).unwrap();
    assert_eq!(reopened.vehicles().unwrap().len(), 1);
}

#[test]
fn test_corrupt_file_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("fleet.json"), "{ not json").unwrap();
    assert!(FleetStore::open(temp_dir.path().to_path_buf()).is_err());
}

#[test]
fn test_failed_write_leaves_state_untouched() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = FleetStore::open(temp_dir.path().to_path_buf()).unwrap();
    let driver = store.insert_driver(DriverFields::new("L1", "Asha")).unwrap();
    let a = store.insert_vehicle(VehicleFields::new("A")).unwrap();
    let b = store.insert_vehicle(VehicleFields::new("B")).unwrap();
    store.insert_association(&driver.id, &a.id).unwrap();

    // A directory where the store file belongs makes every write fail
    let path = store.path().expect("file-backed store").to_path_buf();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = store
        .replace_associations_for_driver(&driver.id, &[b.id.clone()])
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(store.insert_vehicle(VehicleFields::new("C")).is_err());
    assert!(store.remove_driver(&driver.id).is_err());

    let associations = store.associations().unwrap();
    assert_eq!(associations.len(), 1);
    assert_eq!(associations[0].vehicle_id, a.id);
    assert_eq!(store.vehicles().unwrap().len(), 2);
    assert!(store.driver(&driver.id).unwrap().is_some());
}
