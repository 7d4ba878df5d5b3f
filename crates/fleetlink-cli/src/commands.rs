//! Command handlers

use std::path::PathBuf;

use fleetlink_app::app::FleetService;
use fleetlink_app::config::Config;
use fleetlink_types::{
    DispatchMode, DriverFields, OutputFormat, ReconcileMode, ReconciliationReport, Result,
    VehicleFields,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{Cli, Commands, DriverCommand, PaymentCommand, RepairCommand, VehicleCommand};
use crate::output::{
    output_drivers, output_import, output_ledger, output_payments, output_registration,
    output_repairs, output_report, output_totals, output_vehicles,
};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref store) = cli.store {
        config.store_dir = Some(store.clone());
    }
    if let Some(dispatch) = cli.dispatch {
        config.dispatch = dispatch;
    }
    if let Some(ms) = cli.timeout_ms {
        config.set_reconcile_timeout_ms(ms);
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    if let Commands::Config {
        show,
        set_store_dir,
        set_output,
        set_dispatch,
        set_workers,
        set_timeout_ms,
        reset,
    } = &cli.command
    {
        return cmd_config(
            *show,
            set_store_dir.clone(),
            *set_output,
            *set_dispatch,
            *set_workers,
            *set_timeout_ms,
            *reset,
        );
    }

    debug!(store = ?config.store_dir, dispatch = %config.dispatch, "opening fleet store");
    let service = FleetService::from_config(&config)?;

    match cli.command {
        Commands::Vehicle { action } => cmd_vehicle(&service, action, output_format),
        Commands::Driver { action } => cmd_driver(&service, action, output_format),
        Commands::Assign {
            license,
            numbers,
            replace,
        } => {
            let mode = if replace {
                ReconcileMode::Replace
            } else {
                ReconcileMode::Merge
            };
            let report = service.assign(&license, numbers, mode)?;
            output_report(output_format, &report)?;
            warn_unassigned(&report);
            Ok(())
        }
        Commands::Unassign { license, number } => {
            service.unassign(&license, &number)?;
            println!("Vehicle {} unassigned from {}", number, license);
            Ok(())
        }
        Commands::Register {
            license,
            name,
            contact,
            numbers,
        } => {
            let mut fields = DriverFields::new(license, name);
            fields.contact = contact;
            let outcome = service.register_driver_with_vehicles(fields, numbers)?;
            output_registration(output_format, &outcome)?;
            warn_unassigned(&outcome.report);
            Ok(())
        }
        Commands::Payment { action } => cmd_payment(&service, action, output_format),
        Commands::Repair { action } => cmd_repair(&service, action, output_format),
        Commands::Totals => output_totals(output_format, &service.totals()?),
        Commands::Config { .. } => Ok(()),
    }
}

fn warn_unassigned(report: &ReconciliationReport) {
    if !report.is_clean() {
        eprintln!("\nWarning: {} vehicle(s) were not assigned", report.failed.len());
    }
}

fn cmd_vehicle(service: &FleetService, action: VehicleCommand, output_format: OutputFormat) -> Result<()> {
    match action {
        VehicleCommand::Add {
            number,
            vehicle_type,
            brand,
            status,
            purchase_date,
        } => {
            let fields = VehicleFields {
                vehicle_number: number,
                vehicle_type,
                brand,
                status,
                purchase_date,
            };
            let vehicle = service.add_vehicle(fields)?;
            println!("Vehicle {} added", vehicle.vehicle_number);
            Ok(())
        }
        VehicleCommand::List => output_vehicles(output_format, &service.list_vehicles()?),
        VehicleCommand::Remove { number } => {
            service.remove_vehicle(&number)?;
            println!("Vehicle {} removed", number);
            Ok(())
        }
        VehicleCommand::Import { file } => cmd_import(service, file, output_format),
    }
}

fn cmd_import(service: &FleetService, file: PathBuf, output_format: OutputFormat) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(file.display().to_string());

    let result = service.import_roster(&file, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();

    output_import(output_format, &result?)
}

fn cmd_driver(service: &FleetService, action: DriverCommand, output_format: OutputFormat) -> Result<()> {
    match action {
        DriverCommand::Add {
            license,
            name,
            contact,
        } => {
            let mut fields = DriverFields::new(license, name);
            fields.contact = contact;
            let driver = service.add_driver(fields)?;
            println!("Driver {} ({}) added", driver.name, driver.license_number);
            Ok(())
        }
        DriverCommand::List => output_drivers(output_format, &service.list_drivers()?),
        DriverCommand::Update {
            license,
            name,
            new_license,
            contact,
            vehicles,
        } => {
            let current = service.driver(&license)?;
            let fields = DriverFields {
                name: name.unwrap_or(current.name),
                contact: contact.or(current.contact),
                license_number: new_license.unwrap_or(current.license_number),
            };
            let (driver, report) = service.update_driver(&license, fields, vehicles)?;
            match report {
                Some(report) => output_report(output_format, &report),
                None => {
                    println!("Driver {} ({}) updated", driver.name, driver.license_number);
                    Ok(())
                }
            }
        }
        DriverCommand::Remove { license } => {
            service.remove_driver(&license)?;
            println!("Driver {} removed", license);
            Ok(())
        }
        DriverCommand::Licenses => {
            let licenses = service.license_numbers()?;
            if output_format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&licenses)?);
            } else {
                for license in licenses {
                    println!("{}", license);
                }
            }
            Ok(())
        }
    }
}

fn cmd_payment(service: &FleetService, action: PaymentCommand, output_format: OutputFormat) -> Result<()> {
    match action {
        PaymentCommand::Put {
            license,
            date,
            purpose,
            amount,
        } => {
            let created = service.put_payment(&license, date, &purpose, amount)?;
            println!(
                "Payment for {} on {} {}",
                license,
                date,
                if created { "recorded" } else { "updated" }
            );
            Ok(())
        }
        PaymentCommand::Delete { license, date } => {
            service.delete_payment(&license, date)?;
            println!("Payment for {} on {} deleted", license, date);
            Ok(())
        }
        PaymentCommand::List => output_payments(output_format, &service.list_payments()?),
        PaymentCommand::Report { license, from, to } => {
            let report = service.payment_report(&license, from, to)?;
            output_ledger(output_format, &format!("Payments for {}", license), &report)
        }
    }
}

fn cmd_repair(service: &FleetService, action: RepairCommand, output_format: OutputFormat) -> Result<()> {
    match action {
        RepairCommand::Put {
            number,
            date,
            description,
            amount,
        } => {
            let created = service.put_repair(&number, date, &description, amount)?;
            println!(
                "Repair for {} on {} {}",
                number,
                date,
                if created { "recorded" } else { "updated" }
            );
            Ok(())
        }
        RepairCommand::Delete { number, date } => {
            service.delete_repair(&number, date)?;
            println!("Repair for {} on {} deleted", number, date);
            Ok(())
        }
        RepairCommand::List => output_repairs(output_format, &service.list_repairs()?),
        RepairCommand::Report { number, from, to } => {
            let report = service.repair_report(&number, from, to)?;
            output_ledger(output_format, &format!("Repairs for {}", number), &report)
        }
    }
}

fn cmd_config(
    show: bool,
    set_store_dir: Option<PathBuf>,
    set_output: Option<OutputFormat>,
    set_dispatch: Option<DispatchMode>,
    set_workers: Option<usize>,
    set_timeout_ms: Option<u64>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(dir) = set_store_dir {
        config.store_dir = Some(dir);
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(dispatch) = set_dispatch {
        config.dispatch = dispatch;
        modified = true;
    }

    if let Some(workers) = set_workers {
        config.workers = workers;
        modified = true;
    }

    if let Some(ms) = set_timeout_ms {
        config.set_reconcile_timeout_ms(ms);
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
