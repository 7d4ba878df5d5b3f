//! Application use cases

mod fleet_service;

pub use fleet_service::{FleetService, ImportSummary, LedgerTotals, PaymentRecord, RepairRecord};
