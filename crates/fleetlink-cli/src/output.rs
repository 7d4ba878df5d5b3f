//! Output formatting module

use fleetlink_app::app::{ImportSummary, LedgerTotals, PaymentRecord, RepairRecord};
use fleetlink_domain::service::{LedgerReport, RegistrationOutcome};
use fleetlink_types::{DriverRoster, OutputFormat, ReconciliationReport, Result, VehicleRoster};
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn output_report(output_format: OutputFormat, report: &ReconciliationReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    println!("{}", report.summary());
    for item in &report.succeeded {
        println!("  ok    {:<20} {}", item.vehicle_number, item.outcome.label());
    }
    for item in &report.failed {
        println!("  fail  {:<20} {}", item.vehicle_number, item.kind.label());
    }
    Ok(())
}

pub fn output_registration(output_format: OutputFormat, outcome: &RegistrationOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(outcome);
    }

    if outcome.created {
        println!("Registered driver {}", outcome.driver_id);
    } else {
        println!("Driver {} already registered; assigning vehicles", outcome.driver_id);
    }
    output_report(output_format, &outcome.report)
}

pub fn output_drivers(output_format: OutputFormat, drivers: &[DriverRoster]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(drivers);
    }

    if drivers.is_empty() {
        println!("No drivers registered");
        return Ok(());
    }
    println!("{:<16} {:<24} {:<16} Vehicles", "License", "Name", "Contact");
    println!("{}", "-".repeat(72));
    for entry in drivers {
        let driver = &entry.driver;
        println!(
            "{:<16} {:<24} {:<16} {}",
            driver.license_number,
            driver.name,
            or_dash(driver.contact.as_deref()),
            entry.vehicle_numbers.join(", ")
        );
    }
    Ok(())
}

pub fn output_vehicles(output_format: OutputFormat, vehicles: &[VehicleRoster]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(vehicles);
    }

    if vehicles.is_empty() {
        println!("No vehicles registered");
        return Ok(());
    }
    println!(
        "{:<16} {:<10} {:<14} {:<10} {:<12} Drivers",
        "Number", "Type", "Brand", "Status", "Purchased"
    );
    println!("{}", "-".repeat(80));
    for entry in vehicles {
        let vehicle = &entry.vehicle;
        println!(
            "{:<16} {:<10} {:<14} {:<10} {:<12} {}",
            vehicle.vehicle_number,
            or_dash(vehicle.vehicle_type.as_deref()),
            or_dash(vehicle.brand.as_deref()),
            or_dash(vehicle.status.as_deref()),
            vehicle
                .purchase_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.driver_names.join(", ")
        );
    }
    Ok(())
}

pub fn output_import(output_format: OutputFormat, summary: &ImportSummary) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(summary);
    }

    println!(
        "Imported roster: {} created, {} updated, {} skipped",
        summary.created,
        summary.updated,
        summary.skipped.len()
    );
    for (line, reason) in &summary.skipped {
        println!("  line {}: {}", line, reason);
    }
    Ok(())
}

pub fn output_payments(output_format: OutputFormat, payments: &[PaymentRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(payments);
    }

    println!("{:<12} {:<16} {:<20} {:<20} {:>10}", "Date", "License", "Driver", "Purpose", "Amount");
    println!("{}", "-".repeat(82));
    for p in payments {
        println!(
            "{:<12} {:<16} {:<20} {:<20} {:>10.2}",
            p.date, p.license_number, p.driver_name, p.purpose, p.amount
        );
    }
    Ok(())
}

pub fn output_repairs(output_format: OutputFormat, repairs: &[RepairRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(repairs);
    }

    println!("{:<12} {:<16} {:<30} {:>10}", "Date", "Vehicle", "Description", "Amount");
    println!("{}", "-".repeat(71));
    for r in repairs {
        println!(
            "{:<12} {:<16} {:<30} {:>10.2}",
            r.date, r.vehicle_number, r.description, r.amount
        );
    }
    Ok(())
}

pub fn output_ledger(output_format: OutputFormat, title: &str, report: &LedgerReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    println!("\n{} ({} to {})", title, report.start, report.end);
    println!("{}", "=".repeat(50));
    for entry in &report.entries {
        println!("{:<12} {:<26} {:>10.2}", entry.date, entry.description, entry.amount);
    }
    println!("{}", "-".repeat(50));
    println!("{:<39} {:>10.2}", "Total", report.total);
    Ok(())
}

pub fn output_totals(output_format: OutputFormat, totals: &LedgerTotals) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(totals);
    }

    println!("Payments:  {:>12.2}", totals.payments);
    println!("Repairs:   {:>12.2}", totals.repairs);
    Ok(())
}
