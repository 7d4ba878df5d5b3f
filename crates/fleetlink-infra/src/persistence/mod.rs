//! Persistence implementations
//!
//! This module provides store-backed implementations of the domain's
//! collaborator traits.

mod fleet_directory;

pub use fleet_directory::FleetDirectory;
