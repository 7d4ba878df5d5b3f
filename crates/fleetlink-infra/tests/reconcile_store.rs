//! Reconciler running against the file-backed fleet store

use std::sync::Arc;
use std::thread;

use fleetlink_domain::service::{AggregatorConfig, OutcomeAggregator, Reconciler};
use fleetlink_infra::persistence::FleetDirectory;
use fleetlink_store::FleetStore;
use fleetlink_types::{
    DriverFields, FailureKind, OutcomeKind, ReconciliationRequest, VehicleFields,
};
use tempfile::tempdir;

fn reconciler_for(store: &Arc<FleetStore>, config: AggregatorConfig) -> Reconciler {
    let directory = Arc::new(FleetDirectory::new(Arc::clone(store)));
    Reconciler::new(directory.clone(), directory.clone(), directory)
        .with_aggregator(OutcomeAggregator::new(config))
}

#[test]
fn test_scenario_one_known_one_unknown() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = Arc::new(FleetStore::open(temp_dir.path().to_path_buf()).unwrap());
    let driver = store.insert_driver(DriverFields::new("D123", "Ravi")).unwrap();
    let vehicle = store
        .insert_vehicle(VehicleFields::new("KA-01-AB-1234"))
        .unwrap();

    let report = reconciler_for(&store, AggregatorConfig::concurrent(4))
        .reconcile(&ReconciliationRequest::merge(
            driver.id.clone(),
            vec!["KA-01-AB-1234".to_string(), "UNKNOWN-999".to_string()],
        ))
        .unwrap();

    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].outcome, OutcomeKind::Linked);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, FailureKind::VehicleNotFound);

    let associations = store.associations().unwrap();
    assert_eq!(associations.len(), 1);
    assert_eq!(associations[0].driver_id, driver.id);
    assert_eq!(associations[0].vehicle_id, vehicle.id);
}

#[test]
fn test_racing_merges_leave_single_row() {
    let store = Arc::new(FleetStore::in_memory());
    let driver = store.insert_driver(DriverFields::new("L1", "Asha")).unwrap();
    store.insert_vehicle(VehicleFields::new("V")).unwrap();

    for _ in 0..10 {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reconciler = reconciler_for(&store, AggregatorConfig::concurrent(2));
                let request = ReconciliationRequest::merge(driver.id.clone(), vec!["V".to_string()]);
                thread::spawn(move || reconciler.reconcile(&request).unwrap())
            })
            .collect();

        for handle in handles {
            let report = handle.join().unwrap();
            assert_eq!(report.total(), 1);
        }
        assert_eq!(store.associations().unwrap().len(), 1);
    }
}

#[test]
fn test_replace_mode_is_single_write() {
    let store = Arc::new(FleetStore::in_memory());
    let driver = store.insert_driver(DriverFields::new("L1", "Asha")).unwrap();
    for number in ["A", "B", "C"] {
        store.insert_vehicle(VehicleFields::new(number)).unwrap();
    }
    let reconciler = reconciler_for(&store, AggregatorConfig::sequential());

    reconciler
        .reconcile(&ReconciliationRequest::merge(
            driver.id.clone(),
            vec!["A".to_string(), "B".to_string()],
        ))
        .unwrap();
    let report = reconciler
        .reconcile(&ReconciliationRequest::replace(
            driver.id.clone(),
            vec!["C".to_string(), "MISSING".to_string()],
        ))
        .unwrap();

    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].vehicle_number, "C");
    assert_eq!(report.failures_of(FailureKind::VehicleNotFound).len(), 1);
    let numbers: Vec<String> = store
        .vehicles_for_driver(&driver.id)
        .unwrap()
        .into_iter()
        .map(|v| v.vehicle_number)
        .collect();
    assert_eq!(numbers, vec!["C".to_string()]);
}
