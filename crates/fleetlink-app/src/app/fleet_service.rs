//! Fleet Service - use cases over the fleet store
//!
//! Wires the store-backed directories into the reconciler and exposes the
//! register/assign flows alongside plain vehicle, driver and ledger upkeep.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use fleetlink_domain::service::{
    summarize_payments, summarize_repairs, AggregatorConfig, DriverRegistrar, LedgerReport,
    OutcomeAggregator, Reconciler, RegistrationOutcome,
};
use fleetlink_infra::persistence::FleetDirectory;
use fleetlink_infra::roster_csv::load_roster_from_csv;
use fleetlink_store::FleetStore;
use fleetlink_types::{
    Driver, DriverFields, DriverRoster, Error, Payment, ReconcileMode, ReconciliationReport,
    ReconciliationRequest, Repair, Result, Vehicle, VehicleFields, VehicleRoster,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::repository::open_fleet_store;

/// Payment row joined with its driver
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub license_number: String,
    pub driver_name: String,
    pub date: NaiveDate,
    pub purpose: String,
    pub amount: f64,
}

/// Repair row joined with its vehicle
#[derive(Debug, Clone, Serialize)]
pub struct RepairRecord {
    pub vehicle_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LedgerTotals {
    pub payments: f64,
    pub repairs: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<(u64, String)>,
}

pub struct FleetService {
    store: Arc<FleetStore>,
    reconciler: Reconciler,
    registrar: DriverRegistrar,
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "amount must be a positive number, got {}",
            amount
        )));
    }
    Ok(())
}

fn require_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

impl FleetService {
    pub fn new(store: Arc<FleetStore>, aggregator: AggregatorConfig) -> Self {
        let directory = Arc::new(FleetDirectory::new(Arc::clone(&store)));
        let reconciler = Reconciler::new(directory.clone(), directory.clone(), directory)
            .with_aggregator(OutcomeAggregator::new(aggregator));
        let registrar = DriverRegistrar::new(reconciler.clone());
        Self {
            store,
            reconciler,
            registrar,
        }
    }

    /// Open the configured store and apply the configured dispatch settings
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = open_fleet_store(config)?;
        debug!(path = ?store.path(), "fleet store opened");
        Ok(Self::new(store, config.aggregator_config()))
    }

    pub fn store(&self) -> &Arc<FleetStore> {
        &self.store
    }

    /// Look up a driver by license number
    pub fn driver(&self, license_number: &str) -> Result<Driver> {
        self.store
            .driver_by_license(license_number)?
            .ok_or_else(|| Error::NotFound(format!("driver with license {}", license_number)))
    }

    fn vehicle_by_number(&self, vehicle_number: &str) -> Result<Vehicle> {
        self.store
            .vehicle_by_number(vehicle_number)?
            .ok_or_else(|| Error::NotFound(format!("vehicle {}", vehicle_number)))
    }

    // ------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------

    pub fn add_vehicle(&self, fields: VehicleFields) -> Result<Vehicle> {
        require(&fields.vehicle_number, "vehicle number")?;
        let vehicle = self.store.insert_vehicle(fields)?;
        info!(vehicle = %vehicle.vehicle_number, "vehicle added");
        Ok(vehicle)
    }

    /// Update an existing vehicle's metadata or register it
    pub fn upsert_vehicle(&self, fields: VehicleFields) -> Result<(Vehicle, bool)> {
        require(&fields.vehicle_number, "vehicle number")?;
        Ok(self.store.upsert_vehicle(fields)?)
    }

    /// All vehicles with the names of their drivers
    pub fn list_vehicles(&self) -> Result<Vec<VehicleRoster>> {
        self.store
            .vehicles()?
            .into_iter()
            .map(|vehicle| {
                let driver_names = self
                    .store
                    .drivers_for_vehicle(&vehicle.id)?
                    .into_iter()
                    .map(|d| d.name)
                    .collect();
                Ok(VehicleRoster {
                    vehicle,
                    driver_names,
                })
            })
            .collect()
    }

    /// Remove a vehicle with its associations and repair records
    pub fn remove_vehicle(&self, vehicle_number: &str) -> Result<()> {
        let vehicle = self.vehicle_by_number(vehicle_number)?;
        self.store.remove_vehicle(&vehicle.id)?;
        info!(vehicle = %vehicle_number, "vehicle removed");
        Ok(())
    }

    /// Upsert every usable row of a roster CSV. `progress` receives
    /// (rows done, rows total) after each row.
    pub fn import_roster(
        &self,
        path: &Path,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ImportSummary> {
        let import = load_roster_from_csv(path)?;
        let total = import.vehicles.len();
        let mut summary = ImportSummary {
            skipped: import.skipped,
            ..Default::default()
        };
        for (done, fields) in import.vehicles.into_iter().enumerate() {
            let (_, created) = self.store.upsert_vehicle(fields)?;
            progress(done + 1, total);
            if created {
                summary.created += 1;
            } else {
                summary.updated += 1;
            }
        }
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "roster imported"
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Drivers
    // ------------------------------------------------------------------

    pub fn add_driver(&self, fields: DriverFields) -> Result<Driver> {
        require(&fields.license_number, "license number")?;
        require(&fields.name, "driver name")?;
        let driver = self.store.insert_driver(fields)?;
        info!(driver = %driver.id, license = %driver.license_number, "driver added");
        Ok(driver)
    }

    /// Update a driver's profile. A supplied vehicle list replaces the
    /// driver's current assignments.
    pub fn update_driver(
        &self,
        license_number: &str,
        fields: DriverFields,
        vehicle_numbers: Option<Vec<String>>,
    ) -> Result<(Driver, Option<ReconciliationReport>)> {
        require(&fields.license_number, "license number")?;
        require(&fields.name, "driver name")?;
        let existing = self.driver(license_number)?;
        let driver = self.store.update_driver(&existing.id, fields)?;

        let report = match vehicle_numbers {
            Some(numbers) => Some(self.reconciler.reconcile(&ReconciliationRequest::replace(
                driver.id.clone(),
                numbers,
            ))?),
            None => None,
        };
        Ok((driver, report))
    }

    /// All drivers with the numbers of their vehicles
    pub fn list_drivers(&self) -> Result<Vec<DriverRoster>> {
        self.store
            .drivers()?
            .into_iter()
            .map(|driver| {
                let vehicle_numbers = self
                    .store
                    .vehicles_for_driver(&driver.id)?
                    .into_iter()
                    .map(|v| v.vehicle_number)
                    .collect();
                Ok(DriverRoster {
                    driver,
                    vehicle_numbers,
                })
            })
            .collect()
    }

    pub fn license_numbers(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .drivers()?
            .into_iter()
            .map(|d| d.license_number)
            .collect())
    }

    /// Remove a driver with its associations and payments
    pub fn remove_driver(&self, license_number: &str) -> Result<()> {
        let driver = self.driver(license_number)?;
        self.store.remove_driver(&driver.id)?;
        info!(license = %license_number, "driver removed");
        Ok(())
    }

    /// Reconcile a driver's vehicles, addressing the driver by license number
    pub fn assign(
        &self,
        license_number: &str,
        vehicle_numbers: Vec<String>,
        mode: ReconcileMode,
    ) -> Result<ReconciliationReport> {
        let driver = self.driver(license_number)?;
        self.reconcile(ReconciliationRequest {
            driver_id: driver.id,
            vehicle_numbers,
            mode,
        })
    }

    pub fn reconcile(&self, request: ReconciliationRequest) -> Result<ReconciliationReport> {
        Ok(self.reconciler.reconcile(&request)?)
    }

    /// Detach a single vehicle from a driver
    pub fn unassign(&self, license_number: &str, vehicle_number: &str) -> Result<()> {
        let driver = self.driver(license_number)?;
        let vehicle = self.vehicle_by_number(vehicle_number)?;
        if !self.store.remove_association(&driver.id, &vehicle.id)? {
            return Err(Error::NotFound(format!(
                "vehicle {} is not assigned to {}",
                vehicle_number, license_number
            )));
        }
        Ok(())
    }

    /// Register a driver (or reuse an existing license) and link the vehicles
    pub fn register_driver_with_vehicles(
        &self,
        fields: DriverFields,
        vehicle_numbers: Vec<String>,
    ) -> Result<RegistrationOutcome> {
        require(&fields.license_number, "license number")?;
        require(&fields.name, "driver name")?;
        Ok(self.registrar.register(fields, vehicle_numbers)?)
    }

    // ------------------------------------------------------------------
    // Ledgers
    // ------------------------------------------------------------------

    /// Record a payment; an existing payment on the same day is overwritten.
    /// Returns true when a new record was created.
    pub fn put_payment(
        &self,
        license_number: &str,
        date: NaiveDate,
        purpose: &str,
        amount: f64,
    ) -> Result<bool> {
        require(purpose, "purpose")?;
        require_amount(amount)?;
        let driver = self.driver(license_number)?;
        Ok(self.store.upsert_payment(Payment {
            driver_id: driver.id,
            date,
            purpose: purpose.to_string(),
            amount,
        })?)
    }

    pub fn delete_payment(&self, license_number: &str, date: NaiveDate) -> Result<()> {
        let driver = self.driver(license_number)?;
        if !self.store.remove_payment(&driver.id, date)? {
            return Err(Error::NotFound(format!(
                "payment for {} on {}",
                license_number, date
            )));
        }
        Ok(())
    }

    pub fn list_payments(&self) -> Result<Vec<PaymentRecord>> {
        let drivers = self.store.drivers()?;
        Ok(self
            .store
            .payments()?
            .into_iter()
            .map(|p| {
                let driver = drivers.iter().find(|d| d.id == p.driver_id);
                PaymentRecord {
                    license_number: driver.map(|d| d.license_number.clone()).unwrap_or_default(),
                    driver_name: driver.map(|d| d.name.clone()).unwrap_or_default(),
                    date: p.date,
                    purpose: p.purpose,
                    amount: p.amount,
                }
            })
            .collect())
    }

    /// Payments of one driver in an inclusive date range
    pub fn payment_report(
        &self,
        license_number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<LedgerReport> {
        require_range(start, end)?;
        let driver = self.driver(license_number)?;
        let report = summarize_payments(&self.store.payments()?, &driver.id, start, end);
        if report.is_empty() {
            return Err(Error::NotFound(format!(
                "no payments for {} between {} and {}",
                license_number, start, end
            )));
        }
        Ok(report)
    }

    /// Record a repair; an existing record on the same day is overwritten.
    /// Returns true when a new record was created.
    pub fn put_repair(
        &self,
        vehicle_number: &str,
        date: NaiveDate,
        description: &str,
        amount: f64,
    ) -> Result<bool> {
        require(description, "description")?;
        require_amount(amount)?;
        let vehicle = self.vehicle_by_number(vehicle_number)?;
        Ok(self.store.upsert_repair(Repair {
            vehicle_id: vehicle.id,
            date,
            description: description.to_string(),
            amount,
        })?)
    }

    pub fn delete_repair(&self, vehicle_number: &str, date: NaiveDate) -> Result<()> {
        let vehicle = self.vehicle_by_number(vehicle_number)?;
        if !self.store.remove_repair(&vehicle.id, date)? {
            return Err(Error::NotFound(format!(
                "repair for {} on {}",
                vehicle_number, date
            )));
        }
        Ok(())
    }

    pub fn list_repairs(&self) -> Result<Vec<RepairRecord>> {
        let vehicles = self.store.vehicles()?;
        Ok(self
            .store
            .repairs()?
            .into_iter()
            .map(|r| RepairRecord {
                vehicle_number: vehicles
                    .iter()
                    .find(|v| v.id == r.vehicle_id)
                    .map(|v| v.vehicle_number.clone())
                    .unwrap_or_default(),
                date: r.date,
                description: r.description,
                amount: r.amount,
            })
            .collect())
    }

    /// Repairs of one vehicle in an inclusive date range
    pub fn repair_report(
        &self,
        vehicle_number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<LedgerReport> {
        require_range(start, end)?;
        let vehicle = self.vehicle_by_number(vehicle_number)?;
        let report = summarize_repairs(&self.store.repairs()?, &vehicle.id, start, end);
        if report.is_empty() {
            return Err(Error::NotFound(format!(
                "no repairs for {} between {} and {}",
                vehicle_number, start, end
            )));
        }
        Ok(report)
    }

    pub fn payment_total(&self) -> Result<f64> {
        Ok(self.store.payments()?.iter().map(|p| p.amount).sum())
    }

    pub fn repair_total(&self) -> Result<f64> {
        Ok(self.store.repairs()?.iter().map(|r| r.amount).sum())
    }

    /// Grand totals over both ledgers
    pub fn totals(&self) -> Result<LedgerTotals> {
        Ok(LedgerTotals {
            payments: self.payment_total()?,
            repairs: self.repair_total()?,
        })
    }
}
