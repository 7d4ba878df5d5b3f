//! Date-range summaries over payment and repair ledgers

use chrono::NaiveDate;
use fleetlink_types::{DriverId, Payment, Repair, VehicleId};
use serde::Serialize;

/// One dated amount in a ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// Entries inside a date range and their sum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entries: Vec<LedgerEntry>,
    pub total: f64,
}

impl LedgerReport {
    fn from_entries(start: NaiveDate, end: NaiveDate, mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        let total = entries.iter().map(|e| e.amount).sum();
        Self {
            start,
            end,
            entries,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

/// Payments of one driver between `start` and `end`, both inclusive
pub fn summarize_payments(
    payments: &[Payment],
    driver_id: &DriverId,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerReport {
    let entries = payments
        .iter()
        .filter(|p| &p.driver_id == driver_id && in_range(p.date, start, end))
        .map(|p| LedgerEntry {
            date: p.date,
            description: p.purpose.clone(),
            amount: p.amount,
        })
        .collect();
    LedgerReport::from_entries(start, end, entries)
}

/// Repairs of one vehicle between `start` and `end`, both inclusive
pub fn summarize_repairs(
    repairs: &[Repair],
    vehicle_id: &VehicleId,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerReport {
    let entries = repairs
        .iter()
        .filter(|r| &r.vehicle_id == vehicle_id && in_range(r.date, start, end))
        .map(|r| LedgerEntry {
            date: r.date,
            description: r.description.clone(),
            amount: r.amount,
        })
        .collect();
    LedgerReport::from_entries(start, end, entries)
}
