//! Domain services

pub mod aggregator;
pub mod ledger;
pub mod reconciler;
pub mod registration;

pub use aggregator::{AggregatorConfig, ItemResult, Operation, OutcomeAggregator};
pub use ledger::{summarize_payments, summarize_repairs, LedgerEntry, LedgerReport};
pub use reconciler::Reconciler;
pub use registration::{DriverRegistrar, RegistrationOutcome};
