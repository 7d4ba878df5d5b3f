//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fleetlink_types::{DispatchMode, OutputFormat};

#[derive(Parser)]
#[command(name = "fleetlink")]
#[command(version)]
#[command(about = "Driver and vehicle roster with assignment reconciliation")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory. Uses config value if not specified.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// How per-vehicle work is dispatched (sequential, concurrent)
    #[arg(long, global = true)]
    pub dispatch: Option<DispatchMode>,

    /// Upper bound for one reconcile in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage vehicles
    Vehicle {
        #[command(subcommand)]
        action: VehicleCommand,
    },

    /// Manage drivers
    Driver {
        #[command(subcommand)]
        action: DriverCommand,
    },

    /// Assign vehicles to a driver
    Assign {
        /// Driver license number
        license: String,

        /// Vehicle numbers
        numbers: Vec<String>,

        /// Make the listed vehicles the driver's complete set
        #[arg(long)]
        replace: bool,
    },

    /// Detach one vehicle from a driver
    Unassign {
        /// Driver license number
        license: String,

        /// Vehicle number
        number: String,
    },

    /// Register a driver (or reuse the license) and assign vehicles
    Register {
        #[arg(long)]
        license: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        contact: Option<String>,

        /// Vehicle numbers
        numbers: Vec<String>,
    },

    /// Driver payments
    Payment {
        #[command(subcommand)]
        action: PaymentCommand,
    },

    /// Vehicle repairs
    Repair {
        #[command(subcommand)]
        action: RepairCommand,
    },

    /// Grand totals of payments and repairs
    Totals,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default store directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set dispatch mode
        #[arg(long)]
        set_dispatch: Option<DispatchMode>,

        /// Set worker count. 0 = CPU count.
        #[arg(long)]
        set_workers: Option<usize>,

        /// Set reconcile timeout in milliseconds. 0 clears it.
        #[arg(long)]
        set_timeout_ms: Option<u64>,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum VehicleCommand {
    /// Register a vehicle
    Add {
        number: String,

        #[arg(long = "type")]
        vehicle_type: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        status: Option<String>,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        purchase_date: Option<NaiveDate>,
    },

    /// List vehicles with their drivers
    List,

    /// Remove a vehicle with its assignments and repairs
    Remove { number: String },

    /// Upsert vehicles from a roster CSV
    Import {
        /// CSV file: vehicle_number, type, brand, status, [purchase_date]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum DriverCommand {
    /// Add a driver without vehicles
    Add {
        license: String,

        name: String,

        #[arg(long)]
        contact: Option<String>,
    },

    /// List drivers with their vehicles
    List,

    /// Update a driver. --vehicles replaces the assigned set.
    Update {
        license: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        new_license: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        /// Complete vehicle set; pass the flag alone to clear
        #[arg(long, num_args = 0..)]
        vehicles: Option<Vec<String>>,
    },

    /// Remove a driver with assignments and payments
    Remove { license: String },

    /// Print all license numbers
    Licenses,
}

#[derive(Subcommand)]
pub enum PaymentCommand {
    /// Record a payment (overwrites the same driver and day)
    Put {
        license: String,
        date: NaiveDate,
        purpose: String,
        amount: f64,
    },

    /// Delete a payment
    Delete { license: String, date: NaiveDate },

    /// List all payments
    List,

    /// Payments of one driver in a date range (inclusive)
    Report {
        license: String,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum RepairCommand {
    /// Record a repair (overwrites the same vehicle and day)
    Put {
        number: String,
        date: NaiveDate,
        description: String,
        amount: f64,
    },

    /// Delete a repair
    Delete { number: String, date: NaiveDate },

    /// List all repairs
    List,

    /// Repairs of one vehicle in a date range (inclusive)
    Report {
        number: String,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,
    },
}
