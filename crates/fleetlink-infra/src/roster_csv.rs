//! CSV loader for vehicle rosters
//!
//! Expected columns (header row optional):
//! vehicle_number, type, brand, status, [purchase_date]

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use fleetlink_types::{Result, VehicleFields};
use tracing::debug;

/// Rows parsed from a roster file
#[derive(Debug, Default)]
pub struct RosterImport {
    pub vehicles: Vec<VehicleFields>,
    /// (1-based line, reason) for every row that could not be used
    pub skipped: Vec<(u64, String)>,
}

pub fn load_roster_from_csv(path: &Path) -> Result<RosterImport> {
    let file = std::fs::File::open(path)?;
    load_roster(file)
}

pub fn load_roster<R: Read>(reader: R) -> Result<RosterImport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut import = RosterImport::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(index as u64 + 1);
        if index == 0 && is_header(&record) {
            continue;
        }
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        match parse_vehicle_record(&record) {
            Ok(vehicle) => import.vehicles.push(vehicle),
            Err(reason) => {
                debug!(line, reason = %reason, "skipping roster row");
                import.skipped.push((line, reason));
            }
        }
    }
    Ok(import)
}

fn is_header(record: &StringRecord) -> bool {
    record.iter().any(|h| {
        let h = h.to_lowercase();
        h.contains("vehicle") || h.contains("number") || h.contains("brand") || h.contains("status")
    })
}

fn optional(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn parse_vehicle_record(record: &StringRecord) -> std::result::Result<VehicleFields, String> {
    let vehicle_number = optional(record, 0).ok_or("missing vehicle number")?;
    let purchase_date = match optional(record, 4) {
        Some(raw) => Some(
            parse_date(&raw).ok_or_else(|| format!("unrecognised purchase date: {}", raw))?,
        ),
        None => None,
    };

    Ok(VehicleFields {
        vehicle_number,
        vehicle_type: optional(record, 1),
        brand: optional(record, 2),
        status: optional(record, 3),
        purchase_date,
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
