//! Reconcile request and report types

use serde::{Deserialize, Serialize};

use crate::DriverId;

/// How the desired vehicle set is applied to a driver's associations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Only add missing links, never remove existing ones
    #[default]
    Merge,
    /// Drop every existing link, then link exactly the supplied set
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequest {
    pub driver_id: DriverId,
    pub vehicle_numbers: Vec<String>,
    pub mode: ReconcileMode,
}

impl ReconciliationRequest {
    pub fn merge(driver_id: DriverId, vehicle_numbers: Vec<String>) -> Self {
        Self {
            driver_id,
            vehicle_numbers,
            mode: ReconcileMode::Merge,
        }
    }

    pub fn replace(driver_id: DriverId, vehicle_numbers: Vec<String>) -> Self {
        Self {
            driver_id,
            vehicle_numbers,
            mode: ReconcileMode::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// New association created in merge mode
    Linked,
    /// Association reinstated in replace mode
    Replaced,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::Linked => "linked",
            OutcomeKind::Replaced => "replaced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    VehicleNotFound,
    AlreadyAssociated,
    /// The driver vanished between the precondition check and the insert
    DriverNotFound,
    StoreUnavailable,
    Timeout,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::VehicleNotFound => "not found",
            FailureKind::AlreadyAssociated => "already assigned",
            FailureKind::DriverNotFound => "driver not found",
            FailureKind::StoreUnavailable => "store unavailable",
            FailureKind::Timeout => "timed out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSuccess {
    pub vehicle_number: String,
    pub outcome: OutcomeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub vehicle_number: String,
    pub kind: FailureKind,
}

/// Per-item outcome of one reconcile call. A response value, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub succeeded: Vec<ItemSuccess>,
    pub failed: Vec<ItemFailure>,
}

impl ReconciliationReport {
    pub fn record_success(&mut self, vehicle_number: impl Into<String>, outcome: OutcomeKind) {
        self.succeeded.push(ItemSuccess {
            vehicle_number: vehicle_number.into(),
            outcome,
        });
    }

    pub fn record_failure(&mut self, vehicle_number: impl Into<String>, kind: FailureKind) {
        self.failed.push(ItemFailure {
            vehicle_number: vehicle_number.into(),
            kind,
        });
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> Vec<&ItemFailure> {
        self.failed.iter().filter(|f| f.kind == kind).collect()
    }

    /// One-line summary, e.g. "3 of 5 vehicles assigned; 2 failed: X not found, Y already assigned"
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} of {} vehicles assigned",
            self.succeeded.len(),
            self.total()
        );
        if !self.failed.is_empty() {
            let details: Vec<String> = self
                .failed
                .iter()
                .map(|f| format!("{} {}", f.vehicle_number, f.kind.label()))
                .collect();
            line.push_str(&format!(
                "; {} failed: {}",
                self.failed.len(),
                details.join(", ")
            ));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_failures() {
        let mut report = ReconciliationReport::default();
        report.record_success("A", OutcomeKind::Linked);
        report.record_failure("X", FailureKind::VehicleNotFound);
        report.record_failure("Y", FailureKind::AlreadyAssociated);

        assert_eq!(
            report.summary(),
            "1 of 3 vehicles assigned; 2 failed: X not found, Y already assigned"
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_summary_without_failures() {
        let mut report = ReconciliationReport::default();
        report.record_success("A", OutcomeKind::Replaced);
        assert_eq!(report.summary(), "1 of 1 vehicles assigned");
    }

    #[test]
    fn test_report_serializes_snake_case_kinds() {
        let mut report = ReconciliationReport::default();
        report.record_failure("UNKNOWN-999", FailureKind::VehicleNotFound);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"vehicle_not_found\""));
    }
}
